//! API endpoint handlers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use crate::error::EngineError;

const DEFAULT_SEARCH_LIMIT: usize = 20;

fn error_response(err: &EngineError) -> Response {
    let status = match err {
        EngineError::Busy => StatusCode::TOO_MANY_REQUESTS,
        EngineError::NotRunning | EngineError::Cancelled => StatusCode::CONFLICT,
        EngineError::Validation(_) => StatusCode::BAD_REQUEST,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Fetch { .. } => StatusCode::BAD_GATEWAY,
    };
    (
        status,
        Json(json!({ "result": false, "error": err.to_string() })),
    )
        .into_response()
}

/// Aggregate and per-site index counts. Always best-available, even
/// mid-run.
pub async fn statistics(State(state): State<AppState>) -> Response {
    let mut total_pages = 0usize;
    let mut total_lemmas = 0usize;
    let mut detailed = Vec::new();

    for cfg in &state.settings.sites {
        let item = match state.store.site_by_url(&cfg.url).await {
            Some(site) => {
                let pages = state.store.page_count_for_site(site.id).await;
                let lemmas = state.store.lemma_count_for_site(site.id).await;
                total_pages += pages;
                total_lemmas += lemmas;
                json!({
                    "url": cfg.url,
                    "name": cfg.name,
                    "status": site.status.as_str(),
                    "statusTime": site.status_time.timestamp_millis(),
                    "error": site.last_error,
                    "pages": pages,
                    "lemmas": lemmas,
                })
            }
            None => json!({
                "url": cfg.url,
                "name": cfg.name,
                // No run has touched this site yet; claim nothing.
                "status": "NOT_INDEXED",
                "statusTime": chrono::Utc::now().timestamp_millis(),
                "error": null,
                "pages": 0,
                "lemmas": 0,
            }),
        };
        detailed.push(item);
    }

    Json(json!({
        "result": true,
        "statistics": {
            "total": {
                "sites": state.settings.sites.len(),
                "pages": total_pages,
                "lemmas": total_lemmas,
                "indexing": state.coordinator.is_running(),
            },
            "detailed": detailed,
        }
    }))
    .into_response()
}

pub async fn start_indexing(State(state): State<AppState>) -> Response {
    match state.coordinator.start_indexing().await {
        Ok(()) => Json(json!({ "result": true })).into_response(),
        Err(err) => error_response(&err),
    }
}

pub async fn stop_indexing(State(state): State<AppState>) -> Response {
    match state.coordinator.stop_indexing() {
        Ok(()) => Json(json!({ "result": true })).into_response(),
        Err(err) => error_response(&err),
    }
}

#[derive(Debug, Deserialize)]
pub struct IndexPageParams {
    pub url: String,
}

pub async fn index_page(
    State(state): State<AppState>,
    Query(params): Query<IndexPageParams>,
) -> Response {
    match state.coordinator.reindex_page(&params.url).await {
        Ok(()) => Json(json!({ "result": true })).into_response(),
        Err(err) => error_response(&err),
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    pub site: Option<String>,
    #[serde(default)]
    pub offset: usize,
    pub limit: Option<usize>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    match state
        .search
        .search(&params.query, params.site.as_deref(), params.offset, limit)
        .await
    {
        Ok(outcome) => Json(json!({
            "result": true,
            "count": outcome.count,
            "data": outcome.hits,
        }))
        .into_response(),
        Err(err) => error_response(&err),
    }
}
