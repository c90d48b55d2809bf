//! Types for the search system.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::metadata::MediaKind;

/// One search result, shaped for any protocol adapter to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub pid: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    /// Derived release name for this result.
    pub nzb_name: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_broadcast: Option<String>,
}

/// Ephemeral record of one executed search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub term: String,
    pub results: usize,
}

/// Search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Scan the local cache index instead of querying the catalog.
    #[serde(default)]
    pub native: bool,
    /// Path of the cache index file used by native search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_path: Option<PathBuf>,
    /// Seconds a raw result set stays cached (default: 300).
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// Number of recent searches kept in the in-memory log (default: 50).
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_history_capacity() -> usize {
    50
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            native: false,
            index_path: None,
            cache_ttl_secs: default_cache_ttl(),
            history_capacity: default_history_capacity(),
        }
    }
}

/// Errors that can occur during search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Native search index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Native search is enabled but no index path is configured")]
    IndexNotConfigured,
}
