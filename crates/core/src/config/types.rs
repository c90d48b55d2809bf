use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::CatalogConfig;
use crate::fetcher::FetcherConfig;
use crate::metadata::MetadataConfig;
use crate::search::{SearchConfig, Synonym};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Search-term substitution rules, applied at startup.
    #[serde(default)]
    pub synonyms: Vec<Synonym>,
}

impl Config {
    /// Named-string-parameter view for protocol adapters that want one.
    pub fn parameter(&self, name: &str) -> Option<String> {
        match name {
            "download_dir" => Some(self.fetcher.download_dir.display().to_string()),
            "native_search" => Some(self.search.native.to_string()),
            "refresh_interval_hours" => {
                Some(self.fetcher.refresh_interval_hours.to_string())
            }
            _ => None,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("grabarr.db")
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
