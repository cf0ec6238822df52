//! Index maintenance for one page at a time.
//!
//! `Lemma.frequency` is a per-page contribution: it counts distinct pages
//! containing the lemma, while `IndexEntry.weight` carries the in-page
//! occurrence count.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{EngineError, Result};
use crate::models::{Page, PageId};
use crate::repository::IndexStore;

pub struct Indexer {
    store: Arc<IndexStore>,
}

impl Indexer {
    pub fn new(store: Arc<IndexStore>) -> Self {
        Self { store }
    }

    /// Write lemma and entry rows for a freshly stored page.
    ///
    /// If cancellation was signaled before the page's indexing work begins,
    /// nothing is written at all; a stop never leaves partial silent
    /// writes behind.
    pub async fn index_page(
        &self,
        page: &Page,
        lemma_counts: &HashMap<String, f32>,
        cancelled: &AtomicBool,
    ) -> Result<()> {
        if cancelled.load(Ordering::SeqCst) {
            return Err(EngineError::Cancelled);
        }
        for (term, count) in lemma_counts {
            let lemma = self.store.upsert_lemma(page.site_id, term).await;
            self.store.insert_entry(lemma.id, page.id, *count).await;
        }
        Ok(())
    }

    /// Unwind a page's contribution to the index.
    ///
    /// Must run to completion before the page row itself is replaced or
    /// deleted, so no entry is ever orphaned.
    pub async fn remove_index_for_page(&self, page_id: PageId) {
        for entry in self.store.entries_for_page(page_id).await {
            self.store.release_lemma(entry.lemma_id).await;
            self.store.delete_entry(entry.id).await;
        }
    }
}
