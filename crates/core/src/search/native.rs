//! Native search over the download utility's cache index.
//!
//! The refresh invocation of the external utility rebuilds a pipe-delimited
//! index file, one record per line:
//!
//! ```text
//! pid|kind|name|episode_title|series|episode|channel|first_broadcast
//! ```
//!
//! Lines starting with `#` and lines that do not split into enough fields
//! are skipped; a broken record never aborts the scan.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::catalog::SearchHit;

use super::types::SearchError;

const FIELD_COUNT: usize = 8;

/// Scanner over the local cache index file.
pub struct NativeIndex {
    path: PathBuf,
}

impl NativeIndex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Case-insensitive substring scan over record names.
    pub async fn search(&self, term: &str) -> Result<Vec<SearchHit>, SearchError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SearchError::IndexUnavailable(e.to_string()))?;

        let needle = term.to_lowercase();
        let mut hits = Vec::new();

        for line in raw.lines() {
            let Some(record) = parse_line(line) else {
                continue;
            };
            if record.title.to_lowercase().contains(&needle) {
                hits.push(record);
            }
        }

        debug!("Native index scan for '{}' matched {} records", term, hits.len());
        Ok(hits)
    }
}

fn parse_line(line: &str) -> Option<SearchHit> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() < FIELD_COUNT {
        warn!("Skipping malformed index record: {} fields", fields.len());
        return None;
    }

    let optional = |s: &str| {
        if s.is_empty() {
            None
        } else {
            Some(s.to_string())
        }
    };

    Some(SearchHit {
        pid: fields[0].to_string(),
        title: fields[2].to_string(),
        episode_title: optional(fields[3]),
        series: fields[4].parse().ok(),
        episode: fields[5].parse().ok(),
        channel: optional(fields[6]),
        first_broadcast: optional(fields[7]),
    })
}
