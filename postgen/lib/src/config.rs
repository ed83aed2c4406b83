use std::path::PathBuf;

use crate::assemble::ErrorHandlerPolicy;
use crate::error::PostgenError;
use crate::partition::{MatchMode, Strategy};

/// File ogen writes the `Handler` interface into.
pub const SERVER_FILE_NAME: &str = "oas_server_gen.go";

/// File written next to the ogen output when no explicit path is given.
pub const OUTPUT_FILE_NAME: &str = "oas_postgen_services_gen.go";

pub const DEFAULT_FOLDER: &str = "api";
pub const DEFAULT_PACKAGE: &str = "api";
pub const DEFAULT_INTERFACE: &str = "Handler";

/// Configuration for a single generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgenConfig {
    /// Folder holding the ogen output
    pub ogen_folder: PathBuf,
    /// Server interface file, relative to `ogen_folder`
    pub server_file: String,
    /// Interface to split
    pub interface_name: String,
    pub strategy: Strategy,
    pub match_mode: MatchMode,
    pub error_policy: ErrorHandlerPolicy,
    /// Package clause of the generated file
    pub package: String,
    /// Explicit output path; defaults to `<ogen_folder>/oas_postgen_services_gen.go`
    pub out_file: Option<PathBuf>,
    /// OpenAPI document the ogen output was generated from
    pub openapi_file: PathBuf,
}

impl Default for PostgenConfig {
    fn default() -> Self {
        Self {
            ogen_folder: PathBuf::from(DEFAULT_FOLDER),
            server_file: SERVER_FILE_NAME.to_string(),
            interface_name: DEFAULT_INTERFACE.to_string(),
            strategy: Strategy::default(),
            match_mode: MatchMode::default(),
            error_policy: ErrorHandlerPolicy::default(),
            package: DEFAULT_PACKAGE.to_string(),
            out_file: None,
            openapi_file: PathBuf::new(),
        }
    }
}

impl PostgenConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ogen_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.ogen_folder = folder.into();
        self
    }

    pub fn server_file(mut self, file_name: impl Into<String>) -> Self {
        self.server_file = file_name.into();
        self
    }

    pub fn interface_name(mut self, name: impl Into<String>) -> Self {
        self.interface_name = name.into();
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    pub fn error_policy(mut self, policy: ErrorHandlerPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    /// Set the output path. An empty path keeps the default location.
    pub fn out_file(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.out_file = if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        };
        self
    }

    pub fn openapi_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.openapi_file = path.into();
        self
    }

    /// Path of the ogen server file to extract from.
    pub fn server_path(&self) -> PathBuf {
        self.ogen_folder.join(&self.server_file)
    }

    /// Path the generated file is written to.
    pub fn output_path(&self) -> PathBuf {
        match &self.out_file {
            Some(path) => path.clone(),
            None => self.ogen_folder.join(OUTPUT_FILE_NAME),
        }
    }

    /// ## Errors
    /// Returns [`PostgenError::MissingOgenFolder`] when the folder is empty.
    pub fn validate(&self) -> Result<(), PostgenError> {
        if self.ogen_folder.as_os_str().is_empty() {
            return Err(PostgenError::MissingOgenFolder);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn defaults_follow_ogen_layout() {
        let config = PostgenConfig::new();

        assert_eq!(config.server_path(), Path::new("api").join("oas_server_gen.go"));
        assert_eq!(
            config.output_path(),
            Path::new("api").join("oas_postgen_services_gen.go")
        );
        assert_eq!(config.strategy, Strategy::Paths);
        assert_eq!(config.match_mode, MatchMode::Word);
        assert_eq!(config.error_policy, ErrorHandlerPolicy::Separate);
        assert_eq!(config.interface_name, "Handler");
        assert_eq!(config.package, "api");
    }

    #[test]
    fn explicit_output_overrides_folder() {
        let config = PostgenConfig::new()
            .ogen_folder("gen")
            .out_file("services/split.go");
        assert_eq!(config.output_path(), PathBuf::from("services/split.go"));
    }

    #[test]
    fn empty_output_keeps_default() {
        let config = PostgenConfig::new().ogen_folder("gen").out_file("");
        assert_eq!(config.output_path(), Path::new("gen").join(OUTPUT_FILE_NAME));
    }

    #[test]
    fn empty_folder_is_rejected() {
        let err = PostgenConfig::new().ogen_folder("").validate().unwrap_err();
        assert!(matches!(err, PostgenError::MissingOgenFolder));
    }
}
