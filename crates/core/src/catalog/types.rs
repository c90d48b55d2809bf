//! Types for the external programme catalog.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Programme container kind, as reported by the catalog.
///
/// The catalog's metadata is loosely structured; modelling the kind as an
/// explicit tag lets the identity resolver pattern-match instead of probing
/// for field presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgrammeKind {
    Episode,
    Series,
    Brand,
}

/// One ancestor container of a programme, nearest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ancestor {
    pub pid: String,
    pub kind: ProgrammeKind,
    pub title: String,
    /// Position within the parent: an ordinal series number or, for yearly
    /// series, a calendar year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    /// Set when the catalog explicitly tags the position as ordinal.
    #[serde(default)]
    pub ordinal_position: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pid: Option<String>,
}

/// One available media version of a programme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    pub pid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
    /// The preferred encoding among multiple versions.
    #[serde(default)]
    pub canonical: bool,
}

/// Raw per-title metadata fetched from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgrammeMeta {
    pub pid: String,
    pub kind: ProgrammeKind,
    pub title: String,
    /// The item's own position within its parent, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_broadcast: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pid: Option<String>,
    /// Genre/format category titles, most specific first.
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub versions: Vec<Version>,
    /// Ancestor containers, immediate parent first.
    #[serde(default)]
    pub ancestors: Vec<Ancestor>,
}

impl ProgrammeMeta {
    /// The immediate parent container, if any.
    pub fn parent(&self) -> Option<&Ancestor> {
        self.ancestors.first()
    }

    /// The canonical version, falling back to the first listed one.
    pub fn canonical_version(&self) -> Option<&Version> {
        self.versions
            .iter()
            .find(|v| v.canonical)
            .or_else(|| self.versions.first())
    }
}

/// A raw catalog search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub pid: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_broadcast: Option<String>,
}

/// Errors that can occur talking to the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Catalog API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse catalog response: {0}")]
    ParseError(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        CatalogError::ConnectionFailed(e.to_string())
    }
}

/// Trait for programme catalog backends.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Fetch raw metadata for a pid, `None` when the catalog does not know
    /// the pid.
    async fn fetch_metadata(&self, pid: &str) -> Result<Option<ProgrammeMeta>, CatalogError>;

    /// Free-text search over the catalog.
    async fn search(&self, term: &str) -> Result<Vec<SearchHit>, CatalogError>;
}
