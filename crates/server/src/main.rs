mod api;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grabarr_core::metadata::EpisodeCache;
use grabarr_core::queue::UpdatePublisher;
use grabarr_core::{
    load_config, metrics, validate_config, CatalogClient, DownloadFetcher, HistoryStore,
    HttpCatalogClient, KeyValueBackend, MemorySynonymStore, QueueStore, SearchOrchestrator,
    SqliteBackend, SynonymStore,
};

use api::create_router;
use state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("GRABARR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("Download dir: {:?}", config.fetcher.download_dir);

    // Storage backend shared by history and the TTL caches
    let backend: Arc<dyn KeyValueBackend> = Arc::new(
        SqliteBackend::new(&config.database.path).context("Failed to open storage backend")?,
    );
    info!("Storage backend initialized");

    // Live-update channel shared by queue and history
    let publisher = UpdatePublisher::default();

    let queue = Arc::new(QueueStore::new(publisher.clone()));
    let history = Arc::new(HistoryStore::new(Arc::clone(&backend), publisher.clone()));

    // External catalog client
    let catalog: Arc<dyn CatalogClient> = Arc::new(
        HttpCatalogClient::new(config.catalog.clone())
            .context("Failed to create catalog client")?,
    );
    info!("Catalog client initialized for {}", config.catalog.base_url);

    // Episode metadata cache
    let episodes = Arc::new(EpisodeCache::new(
        Arc::clone(&catalog),
        Arc::clone(&backend),
        &config.metadata,
    ));

    // Synonyms from configuration
    let synonyms: Arc<dyn SynonymStore> = Arc::new(MemorySynonymStore::from_synonyms(
        config.synonyms.iter().cloned(),
    ));
    info!("Loaded {} synonyms", config.synonyms.len());

    // Search orchestrator
    let search = Arc::new(
        SearchOrchestrator::new(
            &config.search,
            Arc::clone(&synonyms),
            Arc::clone(&catalog),
            Arc::clone(&backend),
        )
        .context("Failed to create search orchestrator")?,
    );

    // Download fetcher
    let fetcher = Arc::new(DownloadFetcher::new(
        config.fetcher.clone(),
        Arc::clone(&queue),
        Arc::clone(&history),
        Arc::clone(&episodes),
    ));

    // Reconcile downloads orphaned by a previous run, then start the
    // refresh schedule.
    fetcher.cleanup_failed_downloads().await;
    fetcher.start();
    info!("Download fetcher started");

    // Metrics registry
    let registry = prometheus::Registry::new();
    for metric in metrics::all_metrics() {
        registry
            .register(metric)
            .context("Failed to register metric")?;
    }

    // Create app state and router
    let state = Arc::new(AppState::new(
        config.clone(),
        queue,
        history,
        search,
        Arc::clone(&fetcher),
        publisher,
        registry,
    ));

    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    fetcher.stop();
    info!("Download fetcher stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
