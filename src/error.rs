//! Domain error types.

use thiserror::Error;

/// Errors produced by the crawl, index and search pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Network failure or unreadable response while fetching a page.
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// A task observed the stop flag. Expected during shutdown, never a
    /// system failure.
    #[error("indexing stopped by user")]
    Cancelled,

    /// Caller input rejected before any state mutation.
    #[error("{0}")]
    Validation(String),

    /// A site filter or lookup matched no indexed content.
    #[error("{0}")]
    NotFound(String),

    /// An indexing run is already in progress (or still draining).
    #[error("indexing is already running")]
    Busy,

    /// Stop requested while no run is in progress.
    #[error("indexing is not running")]
    NotRunning,
}

impl EngineError {
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
