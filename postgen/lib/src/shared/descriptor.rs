use serde::{Deserialize, Serialize};

/// Name of the constructor-style method ogen adds to every `Handler`.
///
/// It has no operation counterpart and is never matched against the
/// OpenAPI document.
pub const ERROR_HANDLER_METHOD: &str = "NewError";

/// Name of the catch-all group for methods no operation claimed.
pub const UNMATCHED_GROUP: &str = "UnmatchedMethodsHandler";

/// One entry of a Go file's import table, keyed by `path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportDescriptor {
    pub path: String,
    pub package_name: String,
    pub alias: String,
}

impl ImportDescriptor {
    /// Builds the descriptor for an import spec.
    ///
    /// An explicit alias becomes both `alias` and `package_name` (except for
    /// the blank alias `_`, which leaves `package_name` empty). Without an
    /// alias the package name is the last path segment.
    pub fn new(path: impl Into<String>, alias: Option<&str>) -> Self {
        let path = path.into();
        match alias {
            Some(alias) => Self {
                package_name: if alias == "_" {
                    String::new()
                } else {
                    alias.to_string()
                },
                alias: alias.to_string(),
                path,
            },
            None => Self {
                package_name: assumed_package_name(&path),
                alias: String::new(),
                path,
            },
        }
    }

    /// Alias the emitter must write for the qualifier to resolve.
    ///
    /// Unaliased imports whose package name differs from the last path
    /// element (`jwt/v5`, `yaml.v3`, `go-isatty`) get an explicit alias.
    pub fn emitted_alias(&self) -> &str {
        if !self.alias.is_empty() {
            return &self.alias;
        }
        if self.path.rsplit('/').next() == Some(self.package_name.as_str()) {
            ""
        } else {
            &self.package_name
        }
    }

    /// The identifier Go code uses to reference this package.
    pub fn qualifier(&self) -> &str {
        if self.alias.is_empty() {
            &self.package_name
        } else {
            &self.alias
        }
    }

    /// Blank (`_`) and dot (`.`) imports never qualify a type name.
    pub fn is_qualifying(&self) -> bool {
        !matches!(self.alias.as_str(), "_" | ".") && !self.qualifier().is_empty()
    }
}

/// Package name Go tooling assumes for an unaliased import path.
///
/// A trailing major-version element (`/v5`) is skipped, a `go-` prefix is
/// dropped and the name ends at the first character that cannot appear in
/// an identifier, so `gopkg.in/yaml.v3` is `yaml`.
pub fn assumed_package_name(path: &str) -> String {
    let mut elements = path.rsplit('/');
    let mut last = elements.next().unwrap_or_default();
    if is_major_version(last) {
        if let Some(previous) = elements.next() {
            last = previous;
        }
    }

    let last = last.strip_prefix("go-").unwrap_or(last);
    last.chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

fn is_major_version(element: &str) -> bool {
    element
        .strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
}

/// One field of a Go parameter or result list.
///
/// A field may declare several names sharing a type (`a, b int`) or none
/// at all (`context.Context`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Parameter {
    pub names: Vec<String>,
    pub type_name: String,
    pub variadic: bool,
}

impl Parameter {
    pub fn named(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
            type_name: type_name.into(),
            variadic: false,
        }
    }

    pub fn unnamed(type_name: impl Into<String>) -> Self {
        Self {
            names: Vec::new(),
            type_name: type_name.into(),
            variadic: false,
        }
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// Type as written in a signature, including the `...` prefix.
    pub fn display_type(&self) -> String {
        if self.variadic {
            format!("...{}", self.type_name)
        } else {
            self.type_name.clone()
        }
    }
}

/// Language-agnostic description of one interface member.
///
/// `doc_comment` is the only link between a method and an OpenAPI
/// operation identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub doc_comment: String,
    /// `"name type, name type"`; unnamed parameters show as `_`.
    pub typed_parameters: String,
    /// Parameter names only, ready for call forwarding.
    pub parameter_names: String,
    pub returns: String,
    #[serde(skip)]
    pub parameters: Vec<Parameter>,
    #[serde(skip)]
    pub results: Vec<Parameter>,
    /// Import paths the parameter and result types refer to.
    #[serde(skip)]
    pub import_paths: Vec<String>,
}

impl MethodDescriptor {
    pub fn new(
        name: impl Into<String>,
        doc_comment: impl Into<String>,
        parameters: Vec<Parameter>,
        results: Vec<Parameter>,
    ) -> Self {
        Self {
            name: name.into(),
            doc_comment: doc_comment.into(),
            typed_parameters: render_typed_parameters(&parameters),
            parameter_names: render_parameter_names(&parameters),
            returns: render_results(&results),
            parameters,
            results,
            import_paths: Vec::new(),
        }
    }

    pub fn with_imports<I, T>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.import_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_error_handler(&self) -> bool {
        self.name == ERROR_HANDLER_METHOD
    }

    /// Result list as it appears after the parameter list of a signature.
    ///
    /// A single unnamed result stands alone; anything else is parenthesized.
    pub fn result_clause(&self) -> String {
        match self.results.as_slice() {
            [] => String::new(),
            [single] if single.names.is_empty() => format!(" {}", self.returns),
            _ => format!(" ({})", self.returns),
        }
    }

    /// Full method signature as it appears inside a Go interface body.
    pub fn signature(&self) -> String {
        format!(
            "{}({}){}",
            self.name,
            self.typed_parameters,
            self.result_clause()
        )
    }

    /// Typed parameters and forwarded arguments with every parameter named.
    ///
    /// Go forbids mixing named and unnamed parameters and `_` cannot be
    /// forwarded, so missing or blank names are replaced by `p<index>`.
    pub fn forwarding_parameters(&self) -> (String, String) {
        let mut typed = Vec::with_capacity(self.parameters.len());
        let mut forwarded = Vec::new();
        let mut index = 0usize;

        for parameter in &self.parameters {
            let names: Vec<String> = if parameter.names.is_empty() {
                let name = format!("p{index}");
                index += 1;
                vec![name]
            } else {
                parameter
                    .names
                    .iter()
                    .map(|name| {
                        let name = if name == "_" {
                            format!("p{index}")
                        } else {
                            name.clone()
                        };
                        index += 1;
                        name
                    })
                    .collect()
            };

            typed.push(format!("{} {}", names.join(", "), parameter.display_type()));
            for name in names {
                if parameter.variadic {
                    forwarded.push(format!("{name}..."));
                } else {
                    forwarded.push(name);
                }
            }
        }

        (typed.join(", "), forwarded.join(", "))
    }
}

fn render_typed_parameters(parameters: &[Parameter]) -> String {
    parameters
        .iter()
        .map(|parameter| {
            let names = if parameter.names.is_empty() {
                "_".to_string()
            } else {
                parameter.names.join(", ")
            };
            format!("{names} {}", parameter.display_type())
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_parameter_names(parameters: &[Parameter]) -> String {
    parameters
        .iter()
        .map(|parameter| {
            let names = if parameter.names.is_empty() {
                "_".to_string()
            } else {
                parameter.names.join(", ")
            };
            if parameter.variadic {
                format!("{names}...")
            } else {
                names
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_results(results: &[Parameter]) -> String {
    results
        .iter()
        .map(|result| {
            if result.names.is_empty() {
                result.display_type()
            } else {
                format!("{} {}", result.names.join(", "), result.display_type())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// A located interface declaration with everything needed to split it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedInterface {
    pub name: String,
    pub imports: Vec<ImportDescriptor>,
    pub methods: Vec<MethodDescriptor>,
}

impl ExtractedInterface {
    pub fn error_handler(&self) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|method| method.is_error_handler())
    }
}

/// A named subset of interface methods, rendered as its own Go interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodGroup {
    pub name: String,
    pub methods: Vec<MethodDescriptor>,
}

impl MethodGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    pub fn contains(&self, method_name: &str) -> bool {
        self.methods.iter().any(|method| method.name == method_name)
    }

    /// Appends `method` unless a method of the same name is already present.
    pub fn push(&mut self, method: &MethodDescriptor) -> bool {
        if self.contains(&method.name) {
            return false;
        }
        self.methods.push(method.clone());
        true
    }

    pub fn is_unmatched(&self) -> bool {
        self.name == UNMATCHED_GROUP
    }
}

/// The single artifact handed to the Go emitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationInfo {
    pub imports: Vec<ImportDescriptor>,
    pub groups: Vec<MethodGroup>,
    pub error_handler: Option<MethodDescriptor>,
}

impl GenerationInfo {
    /// Every method that ends up in the output, groups first.
    pub fn all_methods(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.groups
            .iter()
            .flat_map(|group| group.methods.iter())
            .chain(self.error_handler.iter())
    }
}
