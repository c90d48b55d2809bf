//! Configuration loading and validation.

pub mod loader;
pub mod types;
pub mod validate;

pub use loader::{load_config, load_config_from_str};
pub use types::{Config, ConfigError, DatabaseConfig, ServerConfig};
pub use validate::validate_config;
