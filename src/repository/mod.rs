//! In-memory index store.
//!
//! Owns the Site/Page/Lemma/IndexEntry tables behind `tokio::sync::RwLock`.
//! Records are integer-keyed; every cross-record reference is a plain id
//! resolved through lookups here. Lemma create-or-bump runs entirely under
//! the lemma-table write lock, which serializes concurrent upserts of the
//! same term without any lock spanning the rest of the pipeline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use tokio::sync::RwLock;

use crate::models::{
    EntryId, IndexEntry, Lemma, LemmaId, Page, PageId, Site, SiteId, SiteStatus,
};

/// Shared persistence for the crawl, index and search subsystems.
#[derive(Default)]
pub struct IndexStore {
    sites: RwLock<HashMap<SiteId, Site>>,
    pages: RwLock<HashMap<PageId, Page>>,
    lemmas: RwLock<HashMap<LemmaId, Lemma>>,
    entries: RwLock<HashMap<EntryId, IndexEntry>>,
    next_id: AtomicI64,
}

impl IndexStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Delete every row in every table. Runs at the start of a full
    /// indexing run.
    pub async fn reset(&self) {
        self.entries.write().await.clear();
        self.lemmas.write().await.clear();
        self.pages.write().await.clear();
        self.sites.write().await.clear();
    }

    // ------------------------------------------------------------------
    // Sites
    // ------------------------------------------------------------------

    pub async fn insert_site(&self, url: &str, name: &str) -> Site {
        let site = Site {
            id: self.next_id(),
            url: url.to_string(),
            name: name.to_string(),
            status: SiteStatus::Indexing,
            status_time: Utc::now(),
            last_error: None,
        };
        self.sites.write().await.insert(site.id, site.clone());
        site
    }

    pub async fn set_site_status(
        &self,
        id: SiteId,
        status: SiteStatus,
        last_error: Option<String>,
    ) {
        if let Some(site) = self.sites.write().await.get_mut(&id) {
            site.status = status;
            site.status_time = Utc::now();
            site.last_error = last_error;
        }
    }

    pub async fn site(&self, id: SiteId) -> Option<Site> {
        self.sites.read().await.get(&id).cloned()
    }

    pub async fn site_by_url(&self, url: &str) -> Option<Site> {
        self.sites.read().await.values().find(|s| s.url == url).cloned()
    }

    pub async fn sites(&self) -> Vec<Site> {
        let mut sites: Vec<Site> = self.sites.read().await.values().cloned().collect();
        sites.sort_by_key(|s| s.id);
        sites
    }

    // ------------------------------------------------------------------
    // Pages
    // ------------------------------------------------------------------

    pub async fn insert_page(
        &self,
        site_id: SiteId,
        path: &str,
        code: u16,
        content: &str,
    ) -> Page {
        let page = Page {
            id: self.next_id(),
            site_id,
            path: path.to_string(),
            code,
            content: content.to_string(),
        };
        self.pages.write().await.insert(page.id, page.clone());
        page
    }

    pub async fn page(&self, id: PageId) -> Option<Page> {
        self.pages.read().await.get(&id).cloned()
    }

    pub async fn page_by_path(&self, site_id: SiteId, path: &str) -> Option<Page> {
        self.pages
            .read()
            .await
            .values()
            .find(|p| p.site_id == site_id && p.path == path)
            .cloned()
    }

    pub async fn delete_page(&self, id: PageId) {
        self.pages.write().await.remove(&id);
    }

    pub async fn page_count_for_site(&self, site_id: SiteId) -> usize {
        self.pages
            .read()
            .await
            .values()
            .filter(|p| p.site_id == site_id)
            .count()
    }

    // ------------------------------------------------------------------
    // Lemmas
    // ------------------------------------------------------------------

    /// Create the site's lemma row with frequency 1, or bump the frequency
    /// of the existing row by 1. Atomic with respect to concurrent upserts
    /// of the same term.
    pub async fn upsert_lemma(&self, site_id: SiteId, term: &str) -> Lemma {
        let mut lemmas = self.lemmas.write().await;
        if let Some(existing) = lemmas
            .values_mut()
            .find(|l| l.site_id == site_id && l.term == term)
        {
            existing.frequency += 1;
            return existing.clone();
        }
        let lemma = Lemma {
            id: self.next_id(),
            site_id,
            term: term.to_string(),
            frequency: 1,
        };
        lemmas.insert(lemma.id, lemma.clone());
        lemma
    }

    /// Decrement the lemma's frequency, deleting the row when it reaches
    /// zero.
    pub async fn release_lemma(&self, id: LemmaId) {
        let mut lemmas = self.lemmas.write().await;
        if let Some(lemma) = lemmas.get_mut(&id) {
            if lemma.frequency <= 1 {
                lemmas.remove(&id);
            } else {
                lemma.frequency -= 1;
            }
        }
    }

    /// Any site's row for the term; lemma rows are per site, so multi-site
    /// lookups go through [`Self::lemmas_by_term`].
    pub async fn lemma_by_term(&self, term: &str) -> Option<Lemma> {
        self.lemmas.read().await.values().find(|l| l.term == term).cloned()
    }

    pub async fn lemmas_by_term(&self, term: &str) -> Vec<Lemma> {
        self.lemmas
            .read()
            .await
            .values()
            .filter(|l| l.term == term)
            .cloned()
            .collect()
    }

    pub async fn lemma_count_for_site(&self, site_id: SiteId) -> usize {
        self.lemmas
            .read()
            .await
            .values()
            .filter(|l| l.site_id == site_id)
            .count()
    }

    // ------------------------------------------------------------------
    // Index entries
    // ------------------------------------------------------------------

    pub async fn insert_entry(&self, lemma_id: LemmaId, page_id: PageId, weight: f32) -> IndexEntry {
        let entry = IndexEntry {
            id: self.next_id(),
            lemma_id,
            page_id,
            weight,
        };
        self.entries.write().await.insert(entry.id, entry.clone());
        entry
    }

    pub async fn entries(&self) -> Vec<IndexEntry> {
        self.entries.read().await.values().cloned().collect()
    }

    pub async fn entries_for_page(&self, page_id: PageId) -> Vec<IndexEntry> {
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.page_id == page_id)
            .cloned()
            .collect()
    }

    pub async fn delete_entry(&self, id: EntryId) {
        self.entries.write().await.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_creates_then_bumps() {
        let store = IndexStore::new();
        let site = store.insert_site("https://example.com", "Example").await;

        let first = store.upsert_lemma(site.id, "cat").await;
        assert_eq!(first.frequency, 1);

        let second = store.upsert_lemma(site.id, "cat").await;
        assert_eq!(second.id, first.id);
        assert_eq!(second.frequency, 2);
    }

    #[tokio::test]
    async fn lemma_rows_are_per_site() {
        let store = IndexStore::new();
        let a = store.insert_site("https://a.example", "A").await;
        let b = store.insert_site("https://b.example", "B").await;

        let on_a = store.upsert_lemma(a.id, "cat").await;
        let on_b = store.upsert_lemma(b.id, "cat").await;
        assert_ne!(on_a.id, on_b.id);
        assert_eq!(on_b.frequency, 1);
        assert_eq!(store.lemmas_by_term("cat").await.len(), 2);
        assert_eq!(store.lemma_count_for_site(a.id).await, 1);
        assert_eq!(store.lemma_count_for_site(b.id).await, 1);
    }

    #[tokio::test]
    async fn release_deletes_at_zero() {
        let store = IndexStore::new();
        let site = store.insert_site("https://example.com", "Example").await;
        let lemma = store.upsert_lemma(site.id, "dog").await;
        store.upsert_lemma(site.id, "dog").await;

        store.release_lemma(lemma.id).await;
        assert_eq!(store.lemma_by_term("dog").await.unwrap().frequency, 1);

        store.release_lemma(lemma.id).await;
        assert!(store.lemma_by_term("dog").await.is_none());
    }

    #[tokio::test]
    async fn concurrent_upserts_are_serialized() {
        use std::sync::Arc;

        let store = Arc::new(IndexStore::new());
        let site = store.insert_site("https://example.com", "Example").await;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.upsert_lemma(site.id, "shared").await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.lemma_by_term("shared").await.unwrap().frequency, 16);
    }

    #[tokio::test]
    async fn page_lookup_by_site_and_path() {
        let store = IndexStore::new();
        let site = store.insert_site("https://example.com", "Example").await;
        store.insert_page(site.id, "/a", 200, "<html></html>").await;

        assert!(store.page_by_path(site.id, "/a").await.is_some());
        assert!(store.page_by_path(site.id, "/b").await.is_none());
        assert_eq!(store.page_count_for_site(site.id).await, 1);
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let store = IndexStore::new();
        let site = store.insert_site("https://example.com", "Example").await;
        let page = store.insert_page(site.id, "/a", 200, "x").await;
        let lemma = store.upsert_lemma(site.id, "cat").await;
        store.insert_entry(lemma.id, page.id, 1.0).await;

        store.reset().await;
        assert!(store.sites().await.is_empty());
        assert!(store.entries().await.is_empty());
        assert!(store.lemma_by_term("cat").await.is_none());
    }
}
