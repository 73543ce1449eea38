//! HTTP API route definitions.

use axum::{
    routing::{any, get},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers::{health, index, metrics_text, toggle_status, update_status, AppState};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Status page
        .route("/", get(index))
        // Update endpoints check auth before the method, so they accept any method
        .route("/update", any(toggle_status))
        .route("/update/status", any(update_status))
        // Health and metrics
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
