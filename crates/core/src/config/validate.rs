//! Configuration validation beyond what serde can express.

use super::{types::Config, ConfigError};

/// Validate a loaded configuration.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.fetcher.executable.as_os_str().is_empty() {
        return Err(ConfigError::Invalid(
            "fetcher.executable must not be empty".to_string(),
        ));
    }

    if config.fetcher.download_dir.as_os_str().is_empty() {
        return Err(ConfigError::Invalid(
            "fetcher.download_dir must not be empty".to_string(),
        ));
    }

    if config.fetcher.timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "fetcher.timeout_secs must be greater than zero".to_string(),
        ));
    }

    if config.search.native && config.search.index_path.is_none() {
        return Err(ConfigError::Invalid(
            "search.index_path is required when search.native is enabled".to_string(),
        ));
    }

    if config.catalog.base_url.is_empty() {
        return Err(ConfigError::Invalid(
            "catalog.base_url must not be empty".to_string(),
        ));
    }

    Ok(())
}
