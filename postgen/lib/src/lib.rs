pub mod assemble;
pub mod config;
pub mod error;
pub mod file;
pub mod naming;
pub mod openapi;
pub mod partition;
pub mod pipeline;
pub mod render;
pub mod shared;

pub use assemble::{ErrorHandlerPolicy, assemble};
pub use config::PostgenConfig;
pub use error::PostgenError;
pub use file::go_file::{GoFile, extract_interface};
pub use openapi::{SpecModel, load_specification};
pub use partition::{MatchMode, PartitionResult, Partitioner, Strategy, partition};
pub use pipeline::{Generated, generate};
pub use render::{RenderOptions, render, write_output};
pub use shared::*;
