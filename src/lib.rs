pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::storage::LocalSink;
pub use core::{etl::TidyEngine, session::Session, transform::TransformPipeline};
pub use domain::model::{ParseSnapshot, RawDocument};
pub use utils::error::{Result, TidyError};
