use std::sync::Arc;

use grabarr_core::queue::UpdatePublisher;
use grabarr_core::{Config, DownloadFetcher, HistoryStore, QueueStore, SearchOrchestrator};

/// Shared application state
pub struct AppState {
    config: Config,
    queue: Arc<QueueStore>,
    history: Arc<HistoryStore>,
    search: Arc<SearchOrchestrator>,
    fetcher: Arc<DownloadFetcher>,
    publisher: UpdatePublisher,
    registry: prometheus::Registry,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        queue: Arc<QueueStore>,
        history: Arc<HistoryStore>,
        search: Arc<SearchOrchestrator>,
        fetcher: Arc<DownloadFetcher>,
        publisher: UpdatePublisher,
        registry: prometheus::Registry,
    ) -> Self {
        Self {
            config,
            queue,
            history,
            search,
            fetcher,
            publisher,
            registry,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn queue(&self) -> &QueueStore {
        &self.queue
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn search(&self) -> &SearchOrchestrator {
        &self.search
    }

    pub fn fetcher(&self) -> &DownloadFetcher {
        &self.fetcher
    }

    pub fn publisher(&self) -> &UpdatePublisher {
        &self.publisher
    }

    pub fn registry(&self) -> &prometheus::Registry {
        &self.registry
    }
}
