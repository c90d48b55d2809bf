//! Search execution: synonym substitution, caching, backend choice,
//! season/episode filtering.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info};

use crate::catalog::{CatalogClient, SearchHit};
use crate::metadata::MediaKind;
use crate::metrics;
use crate::naming;
use crate::store::{BoundedFifo, KeyValueBackend, TtlCache};

use super::native::NativeIndex;
use super::synonyms::{Synonym, SynonymStore};
use super::types::{SearchConfig, SearchError, SearchHistoryEntry, SearchResult};

/// Executes searches against the catalog or the native index.
pub struct SearchOrchestrator {
    synonyms: Arc<dyn SynonymStore>,
    catalog: Arc<dyn CatalogClient>,
    native: Option<NativeIndex>,
    cache: TtlCache<Vec<SearchResult>>,
    history: Mutex<BoundedFifo<SearchHistoryEntry>>,
}

impl SearchOrchestrator {
    pub fn new(
        config: &SearchConfig,
        synonyms: Arc<dyn SynonymStore>,
        catalog: Arc<dyn CatalogClient>,
        backend: Arc<dyn KeyValueBackend>,
    ) -> Result<Self, SearchError> {
        let native = if config.native {
            let path = config
                .index_path
                .as_ref()
                .ok_or(SearchError::IndexNotConfigured)?;
            Some(NativeIndex::new(path.clone()))
        } else {
            None
        };

        Ok(Self {
            synonyms,
            catalog,
            native,
            cache: TtlCache::new(
                backend,
                "search_results",
                Duration::from_secs(config.cache_ttl_secs),
            ),
            history: Mutex::new(BoundedFifo::new(config.history_capacity)),
        })
    }

    /// Run a search, optionally filtered by season and/or episode.
    ///
    /// The raw (unfiltered) result set is cached under the *original* term;
    /// filtering is applied per response.
    pub async fn search(
        &self,
        term: &str,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let synonym = match self.synonyms.get_synonym(term).await {
            Some(s) if s.is_exempt(term) => {
                debug!("Synonym for '{}' blocked by exemption", term);
                None
            }
            other => other,
        };

        if let Some(cached) = self.cache.get(term) {
            metrics::CACHE_LOOKUPS.with_label_values(&["search", "hit"]).inc();
            return Ok(filter_results(cached, season, episode));
        }
        metrics::CACHE_LOOKUPS.with_label_values(&["search", "miss"]).inc();

        let effective_term = synonym
            .as_ref()
            .map(|s| s.target.as_str())
            .unwrap_or(term);

        let (backend_name, hits) = match &self.native {
            Some(index) => ("native", index.search(effective_term).await?),
            None => ("catalog", self.catalog.search(effective_term).await?),
        };
        metrics::SEARCHES_TOTAL.with_label_values(&[backend_name]).inc();
        metrics::SEARCH_RESULTS.observe(hits.len() as f64);

        let results: Vec<SearchResult> = hits
            .into_iter()
            .map(|hit| to_result(hit, synonym.as_ref()))
            .collect();

        info!(
            "Search '{}' via {} returned {} results",
            term,
            backend_name,
            results.len()
        );

        self.cache.set(term, &results);
        self.history.lock().unwrap().push(SearchHistoryEntry {
            term: term.to_string(),
            results: results.len(),
        });

        Ok(filter_results(results, season, episode))
    }

    /// Recent searches, oldest first.
    pub fn search_history(&self) -> Vec<SearchHistoryEntry> {
        self.history.lock().unwrap().snapshot()
    }
}

fn to_result(hit: SearchHit, synonym: Option<&Synonym>) -> SearchResult {
    let kind = if hit.series.is_some() || hit.episode.is_some() {
        MediaKind::Tv
    } else {
        MediaKind::Movie
    };

    let nzb_name = naming::release_name(
        &hit.title,
        kind,
        hit.series,
        hit.episode,
        hit.episode_title.as_deref(),
        synonym,
    );

    SearchResult {
        pid: hit.pid,
        title: hit.title,
        episode_title: hit.episode_title,
        series: hit.series,
        episode: hit.episode,
        nzb_name,
        kind,
        channel: hit.channel,
        first_broadcast: hit.first_broadcast,
    }
}

/// Season is never ignored: with both filters supplied a result must match
/// both fields.
fn filter_results(
    results: Vec<SearchResult>,
    season: Option<u32>,
    episode: Option<u32>,
) -> Vec<SearchResult> {
    results
        .into_iter()
        .filter(|r| match (season, episode) {
            (Some(s), Some(e)) => r.series == Some(s) && r.episode == Some(e),
            (Some(s), None) => r.series == Some(s),
            (None, Some(e)) => r.episode == Some(e),
            (None, None) => true,
        })
        .collect()
}
