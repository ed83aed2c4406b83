use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};
use tree_sitter::{Node, Parser};

use crate::error::PostgenError;
use crate::shared::{ExtractedInterface, ImportDescriptor, MethodDescriptor, Parameter};

/// A parse error reported by tree-sitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxDiagnostic {
    pub message: String,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
}

/// Represents a parsed Go source file backed by tree-sitter.
#[derive(Debug, Clone)]
pub struct GoFile {
    /// Path the source was read from.
    pub file: PathBuf,
    source: String,
    tree: tree_sitter::Tree,
}

impl GoFile {
    /// Creates a new `GoFile` by reading and parsing the file on disk.
    ///
    /// ## Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, PostgenError> {
        let file = path.as_ref().to_path_buf();
        let source = std::fs::read_to_string(&file).map_err(|source| PostgenError::Io {
            path: file.clone(),
            source,
        })?;

        Self::from_source(file, source)
    }

    /// Parses Go source that is already in memory.
    ///
    /// `file` is only used to label errors.
    ///
    /// ## Errors
    /// Returns an error if tree-sitter cannot produce a syntax tree.
    pub fn from_source(file: PathBuf, source: String) -> Result<Self, PostgenError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|_| PostgenError::ParseFailed { path: file.clone() })?;

        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| PostgenError::ParseFailed { path: file.clone() })?;

        let parsed = Self { file, source, tree };

        let diagnostics = parsed.syntax_diagnostics();
        if let Some(first) = diagnostics.first() {
            warn!(
                file = %parsed.file.display(),
                count = diagnostics.len(),
                line = first.line,
                column = first.column,
                "Go source contains syntax errors; extraction may be incomplete"
            );
        }

        Ok(parsed)
    }

    /// Provides the import table of this file in declaration order.
    ///
    /// Entries are unique by import path; a repeated path keeps the last spec.
    pub fn imports(&self) -> Vec<ImportDescriptor> {
        let mut imports: IndexMap<String, ImportDescriptor> = IndexMap::new();
        let root = self.tree.root_node();
        let mut cursor = root.walk();

        for declaration in root.named_children(&mut cursor) {
            if declaration.kind() != "import_declaration" {
                continue;
            }

            for spec in import_specs(declaration) {
                let Some(path_node) = spec.child_by_field_name("path") else {
                    continue;
                };
                let path = self
                    .text(path_node)
                    .trim_matches(|c| c == '"' || c == '`')
                    .to_string();
                let alias = spec.child_by_field_name("name").map(|name| self.text(name));

                imports.insert(path.clone(), ImportDescriptor::new(path, alias));
            }
        }

        imports.into_values().collect()
    }

    /// Provides syntax diagnostics for this file.
    ///
    /// ## Returns
    /// Returns syntax diagnostics derived from tree-sitter error nodes.
    pub fn syntax_diagnostics(&self) -> Vec<SyntaxDiagnostic> {
        let mut diagnostics = Vec::new();
        let mut stack = vec![self.tree.root_node()];

        while let Some(node) = stack.pop() {
            if node.is_error() || node.is_missing() {
                let message = if node.is_missing() {
                    format!("Missing {}", node.kind())
                } else {
                    "Syntax error".to_string()
                };
                let start = node.start_position();

                diagnostics.push(SyntaxDiagnostic {
                    message,
                    line: start.row.saturating_add(1),
                    column: start.column.saturating_add(1),
                });
            }

            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                stack.push(child);
            }
        }

        diagnostics.sort_by_key(|diagnostic| (diagnostic.line, diagnostic.column));
        diagnostics
    }

    /// Locates the interface type named `name` and describes its methods.
    ///
    /// ## Errors
    /// Returns [`PostgenError::InterfaceNotFound`] when no type declaration
    /// with that name declares an interface.
    pub fn interface(&self, name: &str) -> Result<ExtractedInterface, PostgenError> {
        let body = self
            .find_interface(name)
            .ok_or_else(|| PostgenError::InterfaceNotFound {
                name: name.to_string(),
                path: self.file.clone(),
            })?;

        let imports = self.imports();
        let methods = self.methods(body, &imports);
        debug!(interface = name, methods = methods.len(), "extracted interface");

        Ok(ExtractedInterface {
            name: name.to_string(),
            imports,
            methods,
        })
    }

    fn find_interface(&self, name: &str) -> Option<Node<'_>> {
        let root = self.tree.root_node();
        let mut cursor = root.walk();

        for declaration in root.named_children(&mut cursor) {
            if declaration.kind() != "type_declaration" {
                continue;
            }

            let mut spec_cursor = declaration.walk();
            for spec in declaration.named_children(&mut spec_cursor) {
                if spec.kind() != "type_spec" {
                    continue;
                }
                let matches_name = spec
                    .child_by_field_name("name")
                    .is_some_and(|node| self.text(node) == name);
                if !matches_name {
                    continue;
                }
                if let Some(ty) = spec.child_by_field_name("type") {
                    if ty.kind() == "interface_type" {
                        return Some(ty);
                    }
                }
            }
        }

        None
    }

    fn methods(&self, body: Node<'_>, imports: &[ImportDescriptor]) -> Vec<MethodDescriptor> {
        let mut methods = Vec::new();
        let mut pending: Vec<Node<'_>> = Vec::new();
        let mut last_member_row: Option<usize> = None;
        let mut cursor = body.walk();

        for child in body.named_children(&mut cursor) {
            match child.kind() {
                "comment" => {
                    let row = child.start_position().row;
                    // trailing comment on the previous member's line
                    if last_member_row == Some(row) {
                        continue;
                    }
                    let detached = pending
                        .last()
                        .is_some_and(|previous| previous.end_position().row + 1 < row);
                    if detached {
                        pending.clear();
                    }
                    pending.push(child);
                }
                "method_elem" | "method_spec" => {
                    let start_row = child.start_position().row;
                    let attached = pending
                        .last()
                        .is_some_and(|last| last.end_position().row + 1 >= start_row);
                    let doc_comment = if attached {
                        let raw: Vec<&str> = pending.iter().map(|node| self.text(*node)).collect();
                        comment_group_text(&raw)
                    } else {
                        String::new()
                    };
                    pending.clear();
                    last_member_row = Some(child.end_position().row);

                    if let Some(method) = self.method(child, doc_comment, imports) {
                        methods.push(method);
                    }
                }
                _ => {
                    // embedded interfaces and type constraints are not methods
                    pending.clear();
                    last_member_row = Some(child.end_position().row);
                }
            }
        }

        methods
    }

    fn method(
        &self,
        node: Node<'_>,
        doc_comment: String,
        imports: &[ImportDescriptor],
    ) -> Option<MethodDescriptor> {
        let name = self.text(node.child_by_field_name("name")?).to_string();

        let parameters = node
            .child_by_field_name("parameters")
            .map(|list| self.parameter_list(list))
            .unwrap_or_default();

        let results = match node.child_by_field_name("result") {
            Some(result) if result.kind() == "parameter_list" => self.parameter_list(result),
            Some(result) => vec![Parameter::unnamed(self.render_type(result))],
            None => Vec::new(),
        };

        let import_paths = self.referenced_imports(node, &name, imports);
        Some(
            MethodDescriptor::new(name, doc_comment, parameters, results)
                .with_imports(import_paths),
        )
    }

    /// Import paths behind every package qualifier used in `method`.
    fn referenced_imports(
        &self,
        method: Node<'_>,
        method_name: &str,
        imports: &[ImportDescriptor],
    ) -> Vec<String> {
        let mut paths: IndexSet<String> = IndexSet::new();
        let mut stack = vec![method];

        while let Some(node) = stack.pop() {
            if node.kind() == "qualified_type" {
                if let Some(package) = node.child_by_field_name("package") {
                    let package = self.text(package);
                    match imports
                        .iter()
                        .find(|import| import.is_qualifying() && import.qualifier() == package)
                    {
                        Some(import) => {
                            paths.insert(import.path.clone());
                        }
                        None => warn!(
                            method = method_name,
                            package,
                            "package qualifier does not resolve to an import"
                        ),
                    }
                }
                continue;
            }

            // reversed so qualifiers are visited in source order
            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }

        paths.into_iter().collect()
    }

    fn parameter_list(&self, list: Node<'_>) -> Vec<Parameter> {
        let mut parameters = Vec::new();
        let mut cursor = list.walk();

        for field in list.named_children(&mut cursor) {
            let variadic = match field.kind() {
                "parameter_declaration" => false,
                "variadic_parameter_declaration" => true,
                _ => continue,
            };

            let Some(ty) = field.child_by_field_name("type") else {
                continue;
            };

            let mut name_cursor = field.walk();
            let names = field
                .children_by_field_name("name", &mut name_cursor)
                .map(|name| self.text(name).to_string())
                .collect();

            parameters.push(Parameter {
                names,
                type_name: self.render_type(ty),
                variadic,
            });
        }

        parameters
    }

    /// Renders a type expression; anything beyond pointers, slices and
    /// arrays keeps its source text.
    fn render_type(&self, node: Node<'_>) -> String {
        match node.kind() {
            "type_identifier" | "identifier" => self.text(node).to_string(),
            "pointer_type" => match first_named_child(node) {
                Some(inner) => format!("*{}", self.render_type(inner)),
                None => self.text(node).to_string(),
            },
            "slice_type" => match node.child_by_field_name("element") {
                Some(element) => format!("[]{}", self.render_type(element)),
                None => self.text(node).to_string(),
            },
            "array_type" => {
                let length = node
                    .child_by_field_name("length")
                    .map(|length| self.text(length))
                    .unwrap_or_default();
                match node.child_by_field_name("element") {
                    Some(element) => format!("[{length}]{}", self.render_type(element)),
                    None => self.text(node).to_string(),
                }
            }
            "parenthesized_type" => match first_named_child(node) {
                Some(inner) => self.render_type(inner),
                None => self.text(node).to_string(),
            },
            _ => self.text(node).to_string(),
        }
    }

    fn text(&self, node: Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or_default()
    }
}

/// Reads `path` and extracts the interface named `interface_name`.
///
/// ## Errors
/// Returns an error if the file cannot be read or parsed, or the interface
/// is absent.
pub fn extract_interface<P: AsRef<Path>>(
    path: P,
    interface_name: &str,
) -> Result<ExtractedInterface, PostgenError> {
    GoFile::new(path)?.interface(interface_name)
}

/// Import specs of a single or grouped import declaration.
fn import_specs(declaration: Node<'_>) -> Vec<Node<'_>> {
    let mut specs = Vec::new();
    let mut cursor = declaration.walk();

    for child in declaration.named_children(&mut cursor) {
        match child.kind() {
            "import_spec" => specs.push(child),
            "import_spec_list" => {
                let mut list_cursor = child.walk();
                specs.extend(
                    child
                        .named_children(&mut list_cursor)
                        .filter(|spec| spec.kind() == "import_spec"),
                );
            }
            _ => {}
        }
    }

    specs
}

fn first_named_child(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .find(|child| child.kind() != "comment")
}

/// Text of a comment group, following Go's `ast.CommentGroup.Text` rules.
///
/// Comment markers and one leading space are removed, tool directives are
/// dropped, trailing whitespace is trimmed, blank-line runs collapse to one
/// and leading/trailing blank lines are removed. A non-empty result ends
/// with a newline.
pub(crate) fn comment_group_text(comments: &[&str]) -> String {
    let mut lines: Vec<&str> = Vec::new();

    for comment in comments {
        let body = if let Some(rest) = comment.strip_prefix("//") {
            if is_directive(rest) {
                continue;
            }
            rest.strip_prefix(' ').unwrap_or(rest)
        } else if let Some(rest) = comment.strip_prefix("/*") {
            rest.strip_suffix("*/").unwrap_or(rest)
        } else {
            comment
        };

        lines.extend(body.split('\n').map(str::trim_end));
    }

    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.is_empty() && out.last().is_none_or(|last| last.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|last| last.is_empty()) {
        out.pop();
    }

    if out.is_empty() {
        String::new()
    } else {
        let mut text = out.join("\n");
        text.push('\n');
        text
    }
}

/// `//go:generate`, `//nolint:all`, `//line file:1` and friends.
fn is_directive(comment: &str) -> bool {
    if ["line ", "extern ", "export "]
        .iter()
        .any(|prefix| comment.starts_with(prefix))
    {
        return true;
    }

    let Some((word, rest)) = comment.split_once(':') else {
        return false;
    };

    !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && rest
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}
