use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and metrics
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        // Queue
        .route("/queue", get(handlers::get_queue))
        .route("/queue/{pid}", delete(handlers::cancel))
        // History
        .route("/history", get(handlers::get_history))
        .route("/history/{pid}", delete(handlers::delete_history))
        // Search
        .route("/search", get(handlers::search))
        .route("/search/history", get(handlers::search_history))
        // Downloads
        .route("/download/{pid}", post(handlers::download));

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(ws::ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
