//! Router configuration for the API server.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all API routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/statistics", get(handlers::statistics))
        .route("/api/startIndexing", get(handlers::start_indexing))
        .route("/api/stopIndexing", get(handlers::stop_indexing))
        .route("/api/indexPage", post(handlers::index_page))
        .route("/api/search", get(handlers::search))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
