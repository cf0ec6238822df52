//! HTTP API for indexing control and search.
//!
//! Thin mapping of routes onto coordinator and search engine calls; all
//! domain logic lives below this layer.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::coordinator::CrawlCoordinator;
use crate::lemmatizer::TextNormalizer;
use crate::repository::IndexStore;
use crate::search::SearchEngine;

/// Shared state for the API server.
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub store: Arc<IndexStore>,
    pub coordinator: Arc<CrawlCoordinator>,
    pub search: Arc<SearchEngine>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let store = Arc::new(IndexStore::new());
        let coordinator = CrawlCoordinator::new(settings.clone(), Arc::clone(&store));
        let search = Arc::new(SearchEngine::new(
            Arc::clone(&store),
            Arc::new(TextNormalizer::new()),
        ));
        Self {
            settings,
            store,
            coordinator,
            search,
        }
    }
}

/// Start the API server.
pub async fn serve(settings: Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
