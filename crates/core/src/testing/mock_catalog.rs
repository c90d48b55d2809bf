//! Mock catalog client for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::catalog::{CatalogClient, CatalogError, ProgrammeMeta, SearchHit};

/// Mock implementation of the [`CatalogClient`] trait.
///
/// Metadata and search results are configured per pid/term; fetch counts
/// and search terms are recorded for assertions.
#[derive(Default)]
pub struct MockCatalog {
    metas: Mutex<HashMap<String, ProgrammeMeta>>,
    hits: Mutex<HashMap<String, Vec<SearchHit>>>,
    search_terms: Mutex<Vec<String>>,
    metadata_fetches: AtomicUsize,
    fail_next_fetch: AtomicBool,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register metadata returned for its pid.
    pub fn insert_meta(&self, meta: ProgrammeMeta) {
        self.metas.lock().unwrap().insert(meta.pid.clone(), meta);
    }

    /// Register search results for an exact (case-insensitive) term.
    pub fn insert_hits(&self, term: &str, hits: Vec<SearchHit>) {
        self.hits.lock().unwrap().insert(term.to_lowercase(), hits);
    }

    /// Make the next `fetch_metadata` call fail.
    pub fn fail_next_fetch(&self) {
        self.fail_next_fetch.store(true, Ordering::SeqCst);
    }

    /// Number of `fetch_metadata` calls so far.
    pub fn metadata_fetch_count(&self) -> usize {
        self.metadata_fetches.load(Ordering::SeqCst)
    }

    /// Number of `search` calls so far.
    pub fn search_count(&self) -> usize {
        self.search_terms.lock().unwrap().len()
    }

    /// The most recent search term.
    pub fn last_search_term(&self) -> Option<String> {
        self.search_terms.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CatalogClient for MockCatalog {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_metadata(&self, pid: &str) -> Result<Option<ProgrammeMeta>, CatalogError> {
        self.metadata_fetches.fetch_add(1, Ordering::SeqCst);

        if self.fail_next_fetch.swap(false, Ordering::SeqCst) {
            return Err(CatalogError::ConnectionFailed("mock failure".to_string()));
        }

        Ok(self.metas.lock().unwrap().get(pid).cloned())
    }

    async fn search(&self, term: &str) -> Result<Vec<SearchHit>, CatalogError> {
        self.search_terms.lock().unwrap().push(term.to_string());

        Ok(self
            .hits
            .lock()
            .unwrap()
            .get(&term.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }
}
