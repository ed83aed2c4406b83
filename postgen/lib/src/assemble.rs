//! Merges extraction and partition results into [`GenerationInfo`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PostgenError;
use crate::partition::PartitionResult;
use crate::shared::{GenerationInfo, ImportDescriptor};

/// Where the reserved error constructor goes in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorHandlerPolicy {
    /// Kept in [`GenerationInfo::error_handler`] for the emitter.
    #[default]
    Separate,
    /// Appended to every group; kept separate when there are no groups.
    Splice,
    /// Dropped from the output.
    Omit,
}

impl FromStr for ErrorHandlerPolicy {
    type Err = PostgenError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "separate" => Ok(Self::Separate),
            "splice" => Ok(Self::Splice),
            "omit" => Ok(Self::Omit),
            other => Err(PostgenError::UnsupportedErrorPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for ErrorHandlerPolicy {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Separate => "separate",
            Self::Splice => "splice",
            Self::Omit => "omit",
        })
    }
}

pub fn assemble(
    imports: Vec<ImportDescriptor>,
    result: PartitionResult,
    policy: ErrorHandlerPolicy,
) -> GenerationInfo {
    let PartitionResult {
        mut groups,
        error_handler,
        ..
    } = result;

    let error_handler = match (policy, error_handler) {
        (ErrorHandlerPolicy::Separate, handler) => handler,
        (ErrorHandlerPolicy::Splice, Some(handler)) if groups.is_empty() => {
            warn!("no groups to splice the error handler into; keeping it separate");
            Some(handler)
        }
        (ErrorHandlerPolicy::Splice, Some(handler)) => {
            for group in &mut groups {
                group.push(&handler);
            }
            None
        }
        (ErrorHandlerPolicy::Splice | ErrorHandlerPolicy::Omit, _) => None,
    };

    GenerationInfo {
        imports,
        groups,
        error_handler,
    }
}
