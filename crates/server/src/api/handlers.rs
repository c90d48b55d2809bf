//! Plain-JSON handlers over the core stores.
//!
//! Protocol-specific renderings (SABnzbd, NZBGet, Newznab) consume the same
//! snapshots; nothing in the core depends on which adapter is used.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use grabarr_core::FetchError;

use crate::state::AppState;

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&state.registry().gather(), &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, String::new());
    }

    (StatusCode::OK, String::from_utf8_lossy(&buffer).to_string())
}

pub async fn get_queue(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.queue().snapshot())
}

pub async fn get_history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.history().get_history())
}

pub async fn delete_history(
    State(state): State<Arc<AppState>>,
    Path(pid): Path<String>,
) -> impl IntoResponse {
    match state.history().remove_history(&pid).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!("Failed to remove history entry {}: {}", pid, e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    match state
        .search()
        .search(&params.q, params.season, params.episode)
        .await
    {
        Ok(results) => Json(results).into_response(),
        Err(e) => {
            error!("Search '{}' failed: {}", params.q, e);
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

pub async fn search_history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.search().search_history())
}

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    /// Identifier of the requesting integration.
    pub app: Option<String>,
}

pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(pid): Path<String>,
    Query(params): Query<DownloadParams>,
) -> impl IntoResponse {
    match state.fetcher().download(&pid, params.app.as_deref()).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e @ FetchError::UnknownPid(_)) => {
            (StatusCode::NOT_FOUND, e.to_string()).into_response()
        }
        Err(e) => {
            error!("Download of pid {} could not start: {}", pid, e);
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(pid): Path<String>,
) -> impl IntoResponse {
    state.fetcher().cancel(&pid).await;
    StatusCode::NO_CONTENT
}
