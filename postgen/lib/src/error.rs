use std::path::PathBuf;

use thiserror::Error;

/// Errors emitted by the postgen pipeline.
///
/// Every stage returns its error to the caller; nothing is recovered
/// partially. The CLI reports the error once and exits with status `2`.
#[derive(Debug, Error)]
pub enum PostgenError {
    #[error("Failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse `{path}`")]
    ParseFailed { path: PathBuf },

    #[error("Interface `{name}` not found in `{path}`")]
    InterfaceNotFound { name: String, path: PathBuf },

    #[error("Invalid OpenAPI document `{path}`: {reason}")]
    InvalidSpecification { path: PathBuf, reason: String },

    #[error("Separation strategy `{0}` is not supported (expected each, tag or paths)")]
    UnsupportedStrategy(String),

    #[error("Match mode `{0}` is not supported (expected word or contains)")]
    UnsupportedMatchMode(String),

    #[error("Error handler policy `{0}` is not supported (expected separate, splice or omit)")]
    UnsupportedErrorPolicy(String),

    #[error("The ogen folder must not be empty")]
    MissingOgenFolder,

    #[error("Failed to write output file `{path}`: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize generation info: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl PostgenError {
    /// Short label naming the pipeline stage that produced the error.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Io { .. } => "read",
            Self::ParseFailed { .. } | Self::InterfaceNotFound { .. } => "extract",
            Self::InvalidSpecification { .. } => "openapi",
            Self::UnsupportedStrategy(_)
            | Self::UnsupportedMatchMode(_)
            | Self::UnsupportedErrorPolicy(_)
            | Self::MissingOgenFolder => "config",
            Self::Write { .. } => "write",
            Self::Serialize(_) => "verbose",
        }
    }
}
