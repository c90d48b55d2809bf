//! TTL-cached episode metadata lookups.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{CatalogClient, CatalogError};
use crate::metrics;
use crate::store::{KeyValueBackend, TtlCache};

use super::{resolver, EpisodeDetails};

/// Metadata derivation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Seconds a derived metadata entry stays cached (default: 4 hours).
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// Parent-series positions greater than this are calendar years
    /// (default: 1900).
    #[serde(default = "default_year_threshold")]
    pub year_series_threshold: u32,
}

fn default_cache_ttl() -> u64 {
    4 * 60 * 60
}

fn default_year_threshold() -> u32 {
    1900
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl(),
            year_series_threshold: default_year_threshold(),
        }
    }
}

/// Fetches per-title metadata from the catalog, caches it by pid and
/// derives normalized [`EpisodeDetails`].
pub struct EpisodeCache {
    catalog: Arc<dyn CatalogClient>,
    cache: TtlCache<EpisodeDetails>,
    year_threshold: u32,
}

impl EpisodeCache {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        backend: Arc<dyn KeyValueBackend>,
        config: &MetadataConfig,
    ) -> Self {
        Self {
            catalog,
            cache: TtlCache::new(
                backend,
                "episode_details",
                Duration::from_secs(config.cache_ttl_secs),
            ),
            year_threshold: config.year_series_threshold,
        }
    }

    /// Derived details for a pid, `None` when the catalog does not know it.
    ///
    /// Catalog errors propagate; cache failures silently fall through to a
    /// fresh fetch.
    pub async fn details(&self, pid: &str) -> Result<Option<EpisodeDetails>, CatalogError> {
        if let Some(details) = self.cache.get(pid) {
            metrics::CACHE_LOOKUPS.with_label_values(&["metadata", "hit"]).inc();
            return Ok(Some(details));
        }
        metrics::CACHE_LOOKUPS.with_label_values(&["metadata", "miss"]).inc();

        let Some(meta) = self.catalog.fetch_metadata(pid).await? else {
            debug!("Catalog has no metadata for pid {}", pid);
            return Ok(None);
        };

        let details = resolver::derive_details(&meta, self.year_threshold);
        self.cache.set(pid, &details);

        Ok(Some(details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MemoryBackend, MockCatalog};

    fn episode_cache(catalog: Arc<MockCatalog>) -> EpisodeCache {
        EpisodeCache::new(
            catalog,
            Arc::new(MemoryBackend::new()),
            &MetadataConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_unknown_pid_is_none() {
        let catalog = Arc::new(MockCatalog::new());
        let cache = episode_cache(Arc::clone(&catalog));

        assert!(cache.details("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_details_are_derived_and_cached() {
        let catalog = Arc::new(MockCatalog::new());
        catalog.insert_meta(fixtures::movie_meta("m1", "A Film"));
        let cache = episode_cache(Arc::clone(&catalog));

        let first = cache.details("m1").await.unwrap().unwrap();
        assert_eq!(first.title, "A Film");
        assert_eq!(catalog.metadata_fetch_count(), 1);

        // Second lookup is served from the cache.
        let second = cache.details("m1").await.unwrap().unwrap();
        assert_eq!(second, first);
        assert_eq!(catalog.metadata_fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_catalog_error_propagates() {
        let catalog = Arc::new(MockCatalog::new());
        catalog.fail_next_fetch();
        let cache = episode_cache(Arc::clone(&catalog));

        assert!(cache.details("m1").await.is_err());
    }
}
