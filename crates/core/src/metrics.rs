//! Prometheus metrics for core components.

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Download metrics
// =============================================================================

/// Downloads accepted total.
pub static DOWNLOADS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("grabarr_downloads_started_total", "Total downloads started").unwrap()
});

/// Downloads completed total.
pub static DOWNLOADS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "grabarr_downloads_completed_total",
        "Total downloads completed successfully",
    )
    .unwrap()
});

/// Downloads failed total (non-zero exits, timeouts and orphans).
pub static DOWNLOADS_FAILED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "grabarr_downloads_failed_total",
        "Total downloads that failed",
    )
    .unwrap()
});

/// Downloads cancelled total.
pub static DOWNLOADS_CANCELLED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "grabarr_downloads_cancelled_total",
        "Total downloads cancelled",
    )
    .unwrap()
});

/// Download duration in seconds.
pub static DOWNLOAD_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("grabarr_download_duration_seconds", "Duration of downloads").buckets(
            vec![
                30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0, 7200.0, 14400.0,
            ],
        ),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// Search and cache metrics
// =============================================================================

/// Searches executed total by backend.
pub static SEARCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("grabarr_searches_total", "Total searches executed"),
        &["backend"], // "catalog", "native"
    )
    .unwrap()
});

/// Results returned per search.
pub static SEARCH_RESULTS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "grabarr_search_results",
            "Number of results returned per search",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
    )
    .unwrap()
});

/// Cache lookups by cache and result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("grabarr_cache_lookups_total", "Total cache lookups"),
        &["cache", "result"], // cache: "metadata", "search"; result: "hit", "miss"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(DOWNLOADS_STARTED.clone()),
        Box::new(DOWNLOADS_COMPLETED.clone()),
        Box::new(DOWNLOADS_FAILED.clone()),
        Box::new(DOWNLOADS_CANCELLED.clone()),
        Box::new(DOWNLOAD_DURATION.clone()),
        Box::new(SEARCHES_TOTAL.clone()),
        Box::new(SEARCH_RESULTS.clone()),
        Box::new(CACHE_LOOKUPS.clone()),
    ]
}
