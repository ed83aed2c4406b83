//! Thin view over an OpenAPI 3.x document.
//!
//! Only what the partitioner needs is deserialized: the path items with
//! their operation identifiers and tags, and the set of tags the document
//! declares. Schemas and every other section are skipped, so 3.0 and 3.1
//! documents load alike.

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::PostgenError;

/// One operation under a path item.
///
/// An operation without an `operationId` has an empty identifier and never
/// matches a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub identifier: String,
    pub tags: Vec<String>,
}

impl Operation {
    pub fn new<I, T>(identifier: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            identifier: identifier.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathItem {
    pub path: String,
    pub operations: Vec<Operation>,
}

impl PathItem {
    pub fn new(path: impl Into<String>, operations: Vec<Operation>) -> Self {
        Self {
            path: path.into(),
            operations,
        }
    }
}

/// The subset of the root object the partitioner reads.
#[derive(Debug, Deserialize)]
struct RawDocument {
    openapi: String,
    #[serde(default)]
    tags: Vec<RawTag>,
    #[serde(default)]
    paths: Option<IndexMap<String, RawPathItem>>,
}

#[derive(Debug, Deserialize)]
struct RawTag {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawPathItem {
    #[serde(rename = "$ref")]
    reference: Option<String>,
    get: Option<RawOperation>,
    put: Option<RawOperation>,
    post: Option<RawOperation>,
    delete: Option<RawOperation>,
    options: Option<RawOperation>,
    head: Option<RawOperation>,
    patch: Option<RawOperation>,
    trace: Option<RawOperation>,
}

impl RawPathItem {
    /// Operations in the fixed method order get, put, post, delete,
    /// options, head, patch, trace.
    fn operations(self) -> impl Iterator<Item = (&'static str, RawOperation)> {
        [
            ("get", self.get),
            ("put", self.put),
            ("post", self.post),
            ("delete", self.delete),
            ("options", self.options),
            ("head", self.head),
            ("patch", self.patch),
            ("trace", self.trace),
        ]
        .into_iter()
        .filter_map(|(method, operation)| operation.map(|operation| (method, operation)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOperation {
    operation_id: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

/// Read-only view of a loaded document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecModel {
    path_items: Vec<PathItem>,
    declared_tags: IndexSet<String>,
}

impl SpecModel {
    pub fn new<I, T>(path_items: Vec<PathItem>, declared_tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            path_items,
            declared_tags: declared_tags.into_iter().map(Into::into).collect(),
        }
    }

    fn from_raw(document: RawDocument) -> Self {
        let paths = document.paths.unwrap_or_default();
        let mut path_items = Vec::with_capacity(paths.len());

        for (path, item) in paths {
            if let Some(reference) = &item.reference {
                warn!(path = %path, reference = %reference, "skipping referenced path item");
                continue;
            }

            let operations = item
                .operations()
                .map(|(method, operation)| {
                    let identifier = operation.operation_id.unwrap_or_default();
                    if identifier.is_empty() {
                        warn!(path = %path, method, "operation has no operationId");
                    }
                    Operation::new(identifier, operation.tags)
                })
                .collect();

            path_items.push(PathItem::new(path, operations));
        }

        Self::new(path_items, document.tags.into_iter().map(|tag| tag.name))
    }

    /// Parses a YAML or JSON document held in memory.
    ///
    /// ## Errors
    /// Returns [`PostgenError::InvalidSpecification`] when the document does
    /// not deserialize or is not an OpenAPI 3.x document.
    pub fn parse(content: &str, format: DocumentFormat, path: &Path) -> Result<Self, PostgenError> {
        let invalid = |reason: String| PostgenError::InvalidSpecification {
            path: path.to_path_buf(),
            reason,
        };

        let document: RawDocument = match format {
            DocumentFormat::Json => {
                serde_json::from_str(content).map_err(|err| invalid(err.to_string()))?
            }
            DocumentFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|err| invalid(err.to_string()))?
            }
        };

        if !document.openapi.starts_with("3.") {
            return Err(invalid(format!(
                "unsupported OpenAPI version `{}`",
                document.openapi
            )));
        }

        let model = Self::from_raw(document);
        debug!(
            paths = model.path_items.len(),
            operations = model.operation_count(),
            tags = model.declared_tags.len(),
            "loaded OpenAPI document"
        );
        Ok(model)
    }

    pub fn path_items(&self) -> &[PathItem] {
        &self.path_items
    }

    pub fn declared_tags(&self) -> &IndexSet<String> {
        &self.declared_tags
    }

    pub fn is_declared(&self, tag: &str) -> bool {
        self.declared_tags.contains(tag)
    }

    pub fn operation_count(&self) -> usize {
        self.path_items.iter().map(|item| item.operations.len()).sum()
    }
}

/// Serialization format of a specification document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// `.json` files are JSON; everything else is read as YAML.
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Reads and parses the OpenAPI document at `path`.
///
/// ## Errors
/// Returns [`PostgenError::Io`] when the file cannot be read and
/// [`PostgenError::InvalidSpecification`] when it cannot be parsed.
pub fn load_specification<P: AsRef<Path>>(path: P) -> Result<SpecModel, PostgenError> {
    let path: PathBuf = path.as_ref().to_path_buf();
    let content = std::fs::read_to_string(&path).map_err(|source| PostgenError::Io {
        path: path.clone(),
        source,
    })?;

    SpecModel::parse(&content, DocumentFormat::detect(&path), &path)
}
