//! Per-run shared crawl state.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Visited-URL set and cancellation flag for one indexing run.
///
/// Owned by the coordinator and passed by handle into every task of the
/// run; there are no process-wide mutable singletons.
#[derive(Default)]
pub struct CrawlContext {
    visited: Mutex<HashSet<String>>,
    cancelled: AtomicBool,
}

impl CrawlContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic test-and-insert into the run-wide visited set. Returns true
    /// when this call claimed the URL; a URL is fetched at most once per
    /// run because exactly one caller sees true.
    pub fn try_visit(&self, url: &str) -> bool {
        self.visited
            .lock()
            .expect("visited set lock poisoned")
            .insert(url.to_string())
    }

    pub fn has_visited(&self, url: &str) -> bool {
        self.visited
            .lock()
            .expect("visited set lock poisoned")
            .contains(url)
    }

    /// Signal cooperative cancellation; observed before each new unit of
    /// work, never forcibly interrupting an in-flight fetch.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn cancelled_flag(&self) -> &AtomicBool {
        &self.cancelled
    }
}
