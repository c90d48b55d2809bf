pub mod catalog;
pub mod config;
pub mod fetcher;
pub mod metadata;
pub mod metrics;
pub mod naming;
pub mod queue;
pub mod search;
pub mod store;
pub mod testing;

pub use catalog::{CatalogClient, CatalogConfig, CatalogError, HttpCatalogClient};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use fetcher::{DownloadFetcher, FetchError, FetcherConfig};
pub use metadata::{EpisodeCache, EpisodeDetails, MediaKind, MetadataConfig};
pub use queue::{
    HistoryEntry, HistoryStore, QueueEntry, QueueStatus, QueueStore, StoreEvent, UpdatePublisher,
};
pub use search::{
    MemorySynonymStore, SearchConfig, SearchError, SearchOrchestrator, Synonym, SynonymStore,
};
pub use store::{KeyValueBackend, QueuedStore, SqliteBackend, StoreError, TtlCache};
