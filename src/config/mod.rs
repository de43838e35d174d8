//! Configuration loading for the CLI and embedding applications.

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{Config, ContractConfig, DirectorConfig, LoggingConfig};
