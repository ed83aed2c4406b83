//! End-to-end generation: extract, load, partition, assemble, render.

use std::path::PathBuf;

use tracing::info;

use crate::assemble::assemble;
use crate::config::PostgenConfig;
use crate::error::PostgenError;
use crate::file::go_file::extract_interface;
use crate::openapi::load_specification;
use crate::partition::Partitioner;
use crate::render::{RenderOptions, render, write_output};
use crate::shared::{ERROR_HANDLER_METHOD, GenerationInfo};

/// Result of a successful run, not yet written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub info: GenerationInfo,
    /// Rendered Go source.
    pub source: String,
    /// Where [`Generated::write`] puts `source`.
    pub output: PathBuf,
}

impl Generated {
    /// Indented JSON view of the generation info.
    ///
    /// ## Errors
    /// Returns [`PostgenError::Serialize`] if serialization fails.
    pub fn to_json(&self) -> Result<String, PostgenError> {
        Ok(serde_json::to_string_pretty(&self.info)?)
    }

    /// ## Errors
    /// Returns [`PostgenError::Write`] when the output cannot be written.
    pub fn write(&self) -> Result<(), PostgenError> {
        write_output(&self.output, &self.source)?;
        info!(output = %self.output.display(), "wrote generated services");
        Ok(())
    }
}

/// Runs every stage for `config`, stopping at the first error.
///
/// ## Errors
/// Returns the error of the first failing stage.
pub fn generate(config: &PostgenConfig) -> Result<Generated, PostgenError> {
    config.validate()?;

    let server_path = config.server_path();
    info!(file = %server_path.display(), interface = %config.interface_name, "extracting interface");
    let interface = extract_interface(&server_path, &config.interface_name)?;

    info!(file = %config.openapi_file.display(), "loading OpenAPI document");
    let spec = load_specification(&config.openapi_file)?;

    let result = Partitioner::new(config.strategy)
        .match_mode(config.match_mode)
        .partition(&interface.methods, &spec);
    info!(
        strategy = %config.strategy,
        groups = result.groups.len(),
        methods = interface.methods.len(),
        "partitioned interface"
    );

    let has_error_handler = interface.error_handler().is_some();
    let info = assemble(interface.imports, result, config.error_policy);

    // the composite only satisfies the interface if NewError is forwarded
    let assert_interface = !has_error_handler || forwards_error_handler(&info);
    let source = render(
        &info,
        &RenderOptions {
            package: config.package.clone(),
            interface_name: config.interface_name.clone(),
            assert_interface,
        },
    );

    Ok(Generated {
        info,
        source,
        output: config.output_path(),
    })
}

fn forwards_error_handler(info: &GenerationInfo) -> bool {
    info.error_handler.is_some()
        || info
            .groups
            .iter()
            .any(|group| group.contains(ERROR_HANDLER_METHOD))
}
