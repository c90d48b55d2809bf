//! HTTP programme catalog client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{
    Ancestor, CatalogClient, CatalogError, ProgrammeKind, ProgrammeMeta, SearchHit, Version,
};

/// HTTP catalog client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Catalog base URL (e.g. "https://catalog.example.org").
    pub base_url: String,
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://catalog.example.org".to_string(),
            timeout_secs: default_timeout(),
        }
    }
}

/// HTTP catalog client.
pub struct HttpCatalogClient {
    client: Client,
    base_url: String,
}

impl HttpCatalogClient {
    /// Create a new client from configuration.
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_metadata(&self, pid: &str) -> Result<Option<ProgrammeMeta>, CatalogError> {
        let url = format!("{}/programmes/{}.json", self.base_url, pid);

        debug!("Catalog metadata fetch: pid={}", pid);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let envelope: ProgrammeResponse = response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse programme response: {}", e))
        })?;

        Ok(Some(envelope.programme.into()))
    }

    async fn search(&self, term: &str) -> Result<Vec<SearchHit>, CatalogError> {
        let url = format!(
            "{}/search.json?q={}",
            self.base_url,
            urlencoding::encode(term)
        );

        debug!("Catalog search: term='{}'", term);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let envelope: SearchResponse = response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse search response: {}", e))
        })?;

        Ok(envelope.results.into_iter().map(|r| r.into()).collect())
    }
}

// ============================================================================
// Catalog API response types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ProgrammeResponse {
    programme: RawProgramme,
}

#[derive(Debug, Deserialize)]
struct RawProgramme {
    pid: String,
    #[serde(rename = "type")]
    kind: String,
    title: String,
    position: Option<u32>,
    #[serde(default)]
    ordinal_position: bool,
    short_synopsis: Option<String>,
    channel: Option<String>,
    first_broadcast_date: Option<String>,
    image: Option<RawImage>,
    #[serde(default)]
    categories: Vec<RawCategory>,
    #[serde(default)]
    versions: Vec<RawVersion>,
    parent: Option<Box<RawParent>>,
}

#[derive(Debug, Deserialize)]
struct RawParent {
    programme: RawParentProgramme,
}

#[derive(Debug, Deserialize)]
struct RawParentProgramme {
    pid: String,
    #[serde(rename = "type")]
    kind: String,
    title: String,
    position: Option<u32>,
    #[serde(default)]
    ordinal_position: bool,
    image: Option<RawImage>,
    parent: Option<Box<RawParent>>,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    pid: String,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    title: String,
}

#[derive(Debug, Deserialize)]
struct RawVersion {
    pid: String,
    duration: Option<u32>,
    #[serde(default)]
    canonical: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<RawSearchResult>,
}

#[derive(Debug, Deserialize)]
struct RawSearchResult {
    pid: String,
    title: String,
    episode_title: Option<String>,
    series: Option<u32>,
    episode: Option<u32>,
    channel: Option<String>,
    first_broadcast_date: Option<String>,
}

// ============================================================================
// Conversions
// ============================================================================

/// Leaf items the catalog reports with kinds other than the three known
/// containers (e.g. clips) behave like episodes for identity purposes.
fn parse_kind(kind: &str) -> ProgrammeKind {
    match kind {
        "series" => ProgrammeKind::Series,
        "brand" => ProgrammeKind::Brand,
        _ => ProgrammeKind::Episode,
    }
}

fn flatten_ancestors(mut parent: Option<Box<RawParent>>) -> Vec<Ancestor> {
    let mut ancestors = Vec::new();

    while let Some(raw) = parent {
        let programme = raw.programme;
        ancestors.push(Ancestor {
            pid: programme.pid,
            kind: parse_kind(&programme.kind),
            title: programme.title,
            position: programme.position,
            ordinal_position: programme.ordinal_position,
            image_pid: programme.image.map(|i| i.pid),
        });
        parent = programme.parent;
    }

    ancestors
}

impl From<RawProgramme> for ProgrammeMeta {
    fn from(raw: RawProgramme) -> Self {
        Self {
            kind: parse_kind(&raw.kind),
            pid: raw.pid,
            title: raw.title,
            position: raw.position,
            description: raw.short_synopsis,
            channel: raw.channel,
            first_broadcast: raw.first_broadcast_date,
            image_pid: raw.image.map(|i| i.pid),
            categories: raw.categories.into_iter().map(|c| c.title).collect(),
            versions: raw
                .versions
                .into_iter()
                .map(|v| Version {
                    pid: v.pid,
                    duration_secs: v.duration,
                    canonical: v.canonical,
                })
                .collect(),
            ancestors: flatten_ancestors(raw.parent),
        }
    }
}

impl From<RawSearchResult> for SearchHit {
    fn from(raw: RawSearchResult) -> Self {
        Self {
            pid: raw.pid,
            title: raw.title,
            episode_title: raw.episode_title,
            series: raw.series,
            episode: raw.episode,
            channel: raw.channel,
            first_broadcast: raw.first_broadcast_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_programme_conversion_flattens_parent_chain() {
        let json = r#"{
            "pid": "p01abcd1",
            "type": "episode",
            "title": "Episode 3",
            "position": 3,
            "short_synopsis": "Third outing.",
            "channel": "Channel One",
            "first_broadcast_date": "2024-02-01T21:00:00Z",
            "image": {"pid": "img-ep"},
            "categories": [{"title": "Drama"}, {"title": "Crime"}],
            "versions": [
                {"pid": "v1", "duration": 3480, "canonical": false},
                {"pid": "v2", "duration": 3600, "canonical": true}
            ],
            "parent": {
                "programme": {
                    "pid": "s-pid",
                    "type": "series",
                    "title": "Series 2",
                    "position": 2,
                    "parent": {
                        "programme": {
                            "pid": "b-pid",
                            "type": "brand",
                            "title": "The Show",
                            "position": null,
                            "image": {"pid": "img-brand"}
                        }
                    }
                }
            }
        }"#;

        let raw: RawProgramme = serde_json::from_str(json).unwrap();
        let meta: ProgrammeMeta = raw.into();

        assert_eq!(meta.pid, "p01abcd1");
        assert_eq!(meta.kind, ProgrammeKind::Episode);
        assert_eq!(meta.position, Some(3));
        assert_eq!(meta.categories, vec!["Drama", "Crime"]);

        assert_eq!(meta.ancestors.len(), 2);
        assert_eq!(meta.ancestors[0].kind, ProgrammeKind::Series);
        assert_eq!(meta.ancestors[0].position, Some(2));
        assert_eq!(meta.ancestors[1].kind, ProgrammeKind::Brand);
        assert_eq!(meta.ancestors[1].image_pid, Some("img-brand".to_string()));

        let canonical = meta.canonical_version().unwrap();
        assert_eq!(canonical.pid, "v2");
    }

    #[test]
    fn test_programme_without_parent() {
        let json = r#"{
            "pid": "m0001",
            "type": "episode",
            "title": "A Film",
            "versions": [{"pid": "v1", "duration": 5400}]
        }"#;

        let raw: RawProgramme = serde_json::from_str(json).unwrap();
        let meta: ProgrammeMeta = raw.into();

        assert!(meta.parent().is_none());
        // No canonical flag: first version wins.
        assert_eq!(meta.canonical_version().unwrap().pid, "v1");
    }

    #[test]
    fn test_unknown_kind_is_treated_as_episode() {
        assert_eq!(parse_kind("clip"), ProgrammeKind::Episode);
        assert_eq!(parse_kind("series"), ProgrammeKind::Series);
        assert_eq!(parse_kind("brand"), ProgrammeKind::Brand);
    }

    #[test]
    fn test_search_result_conversion() {
        let json = r#"{
            "results": [
                {"pid": "p1", "title": "The Show", "series": 1, "episode": 2,
                 "episode_title": "Two", "channel": "Channel One",
                 "first_broadcast_date": "2024-01-01T20:00:00Z"},
                {"pid": "p2", "title": "A Film"}
            ]
        }"#;

        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        let hits: Vec<SearchHit> = parsed.results.into_iter().map(|r| r.into()).collect();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].series, Some(1));
        assert_eq!(hits[0].episode, Some(2));
        assert!(hits[1].series.is_none());
    }
}
