//! Ranked keyword search over the lemma index.

mod snippet;

pub use snippet::build_snippet;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::normalize_site_url;
use crate::error::{EngineError, Result};
use crate::lemmatizer::TextNormalizer;
use crate::models::{Page, PageId};
use crate::repository::IndexStore;

/// One ranked search result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub site: String,
    pub site_name: String,
    pub uri: String,
    pub title: String,
    pub snippet: String,
    pub relevance: f32,
}

/// Full qualifying-set size plus the requested page of results.
#[derive(Debug)]
pub struct SearchOutcome {
    pub count: usize,
    pub hits: Vec<SearchHit>,
}

pub struct SearchEngine {
    store: Arc<IndexStore>,
    normalizer: Arc<TextNormalizer>,
}

impl SearchEngine {
    pub fn new(store: Arc<IndexStore>, normalizer: Arc<TextNormalizer>) -> Self {
        Self { store, normalizer }
    }

    /// Strict-AND ranked search.
    ///
    /// A page qualifies only when it carries an index entry for every
    /// distinct query lemma; a query lemma absent from the index therefore
    /// empties the result set. Relevance is normalized against the best
    /// qualifying page.
    pub async fn search(
        &self,
        query: &str,
        site_filter: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<SearchOutcome> {
        if query.trim().is_empty() {
            return Err(EngineError::Validation("empty search query".to_string()));
        }

        let mut terms: Vec<String> = self.normalizer.normalize(query).into_keys().collect();
        terms.sort();

        // Lemma rows are per site, so one query term may map to several ids.
        let mut term_by_lemma_id: HashMap<i64, String> = HashMap::new();
        for term in &terms {
            for lemma in self.store.lemmas_by_term(term).await {
                term_by_lemma_id.insert(lemma.id, term.clone());
            }
        }

        let entries = self.store.entries().await;
        let mut pages: HashMap<PageId, Page> = HashMap::new();
        for entry in &entries {
            if !pages.contains_key(&entry.page_id) {
                if let Some(page) = self.store.page(entry.page_id).await {
                    pages.insert(page.id, page);
                }
            }
        }

        // Candidate pool, restricted to the filtered site when requested.
        let pool: Vec<&crate::models::IndexEntry> = match site_filter {
            Some(filter) => {
                let filter_url = normalize_site_url(filter);
                let site_id = self.store.site_by_url(&filter_url).await.map(|s| s.id);
                let pool: Vec<_> = entries
                    .iter()
                    .filter(|e| {
                        site_id.is_some()
                            && pages
                                .get(&e.page_id)
                                .is_some_and(|p| Some(p.site_id) == site_id)
                    })
                    .collect();
                if pool.is_empty() {
                    return Err(EngineError::NotFound(
                        "no indexed pages for the requested site".to_string(),
                    ));
                }
                pool
            }
            None => entries.iter().collect(),
        };

        // Per-page weight per query lemma.
        let mut per_page: HashMap<PageId, HashMap<&str, f32>> = HashMap::new();
        for entry in &pool {
            if let Some(term) = term_by_lemma_id.get(&entry.lemma_id) {
                *per_page
                    .entry(entry.page_id)
                    .or_default()
                    .entry(term.as_str())
                    .or_insert(0.0) += entry.weight;
            }
        }

        // Strict AND, then absolute relevance as the weight sum.
        let mut qualifying: Vec<(PageId, f32)> = per_page
            .into_iter()
            .filter(|(_, weights)| weights.len() == terms.len())
            .map(|(page_id, weights)| (page_id, weights.values().sum()))
            .collect();
        // Deterministic base order before the stable relevance sort.
        qualifying.sort_by_key(|(page_id, _)| *page_id);

        let max_abs = qualifying.iter().map(|(_, a)| *a).fold(0.0f32, f32::max);
        let mut ranked: Vec<(PageId, f32)> = qualifying
            .into_iter()
            .map(|(page_id, abs)| {
                // Divide by the page's own value when the maximum is zero.
                let relevance = if max_abs == 0.0 { abs } else { abs / max_abs };
                (page_id, relevance)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let count = ranked.len();
        let mut hits = Vec::new();
        for (page_id, relevance) in ranked.into_iter().skip(offset).take(limit) {
            let page = match pages.get(&page_id) {
                Some(page) => page,
                None => continue,
            };
            let site = match self.store.site(page.site_id).await {
                Some(site) => site,
                None => continue,
            };
            hits.push(SearchHit {
                site: site.url,
                site_name: site.name,
                uri: page.path.clone(),
                title: extract_title(&page.content),
                snippet: build_snippet(&self.normalizer, &page.content, &terms),
                relevance,
            });
        }

        Ok(SearchOutcome { count, hits })
    }
}

/// Substring between the first `<title>` and `</title>` markers of the
/// stored content, empty when absent.
fn extract_title(content: &str) -> String {
    let start = match content.find("<title>") {
        Some(i) => i + "<title>".len(),
        None => return String::new(),
    };
    match content[start..].find("</title>") {
        Some(end) => content[start..start + end].to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::clean_document;
    use crate::indexer::Indexer;
    use crate::models::{Site, SiteId};

    use std::sync::atomic::AtomicBool;

    struct Fixture {
        store: Arc<IndexStore>,
        engine: SearchEngine,
        site: Site,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(IndexStore::new());
        let normalizer = Arc::new(TextNormalizer::new());
        let site = store.insert_site("https://example.com", "Example").await;
        let engine = SearchEngine::new(Arc::clone(&store), normalizer);
        Fixture { store, engine, site }
    }

    async fn index_page(store: &Arc<IndexStore>, site_id: SiteId, path: &str, body: &str) {
        let content = format!(
            "<html><head><title>{path}</title></head><body>{body}</body></html>"
        );
        let page = store.insert_page(site_id, path, 200, &content).await;
        let normalizer = TextNormalizer::new();
        let counts = normalizer.normalize(&clean_document(&content));
        let indexer = Indexer::new(Arc::clone(store));
        indexer
            .index_page(&page, &counts, &AtomicBool::new(false))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn single_lemma_matches_both_pages_with_equal_relevance() {
        let f = fixture().await;
        index_page(&f.store, f.site.id, "/a", "cat dog").await;
        index_page(&f.store, f.site.id, "/b", "dog bird").await;

        let outcome = f.engine.search("dog", None, 0, 20).await.unwrap();
        assert_eq!(outcome.count, 2);
        assert_eq!(outcome.hits.len(), 2);
        for hit in &outcome.hits {
            assert_eq!(hit.relevance, 1.0);
            assert_eq!(hit.site, "https://example.com");
            assert_eq!(hit.site_name, "Example");
            assert!(hit.snippet.contains("<b>dog</b>"));
        }
    }

    #[tokio::test]
    async fn and_semantics_require_every_lemma() {
        let f = fixture().await;
        index_page(&f.store, f.site.id, "/a", "cat dog").await;
        index_page(&f.store, f.site.id, "/b", "dog bird").await;

        let outcome = f.engine.search("cat bird", None, 0, 20).await.unwrap();
        assert_eq!(outcome.count, 0);
        assert!(outcome.hits.is_empty());
    }

    #[tokio::test]
    async fn unknown_lemma_empties_the_result_set() {
        let f = fixture().await;
        index_page(&f.store, f.site.id, "/a", "cat dog").await;

        let outcome = f.engine.search("cat zebra", None, 0, 20).await.unwrap();
        assert_eq!(outcome.count, 0);
    }

    #[tokio::test]
    async fn relevance_is_normalized_to_the_best_page() {
        let f = fixture().await;
        index_page(&f.store, f.site.id, "/a", "dog dog dog").await;
        index_page(&f.store, f.site.id, "/b", "dog").await;

        let outcome = f.engine.search("dog", None, 0, 20).await.unwrap();
        assert_eq!(outcome.count, 2);
        assert_eq!(outcome.hits[0].uri, "/a");
        assert_eq!(outcome.hits[0].relevance, 1.0);
        assert!(outcome.hits[1].relevance < 1.0);
        assert!(outcome.hits[1].relevance > 0.0);
    }

    #[tokio::test]
    async fn pagination_preserves_total_count() {
        let f = fixture().await;
        for path in ["/a", "/b", "/c"] {
            index_page(&f.store, f.site.id, path, "dog").await;
        }

        let first = f.engine.search("dog", None, 0, 2).await.unwrap();
        assert_eq!(first.count, 3);
        assert_eq!(first.hits.len(), 2);

        let rest = f.engine.search("dog", None, 2, 2).await.unwrap();
        assert_eq!(rest.count, 3);
        assert_eq!(rest.hits.len(), 1);

        // Offset past the qualifying set is an empty page, not an error.
        let past = f.engine.search("dog", None, 10, 2).await.unwrap();
        assert_eq!(past.count, 3);
        assert!(past.hits.is_empty());
    }

    #[tokio::test]
    async fn blank_query_is_rejected() {
        let f = fixture().await;
        let err = f.engine.search("   ", None, 0, 20).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn site_filter_restricts_results() {
        let f = fixture().await;
        let other = f.store.insert_site("https://other.org", "Other").await;
        index_page(&f.store, f.site.id, "/a", "cat dog").await;
        index_page(&f.store, other.id, "/x", "dog").await;

        let outcome = f
            .engine
            .search("dog", Some("https://other.org"), 0, 20)
            .await
            .unwrap();
        assert_eq!(outcome.count, 1);
        assert_eq!(outcome.hits[0].uri, "/x");
    }

    #[tokio::test]
    async fn site_filter_without_indexed_pages_is_not_found() {
        let f = fixture().await;
        f.store.insert_site("https://empty.org", "Empty").await;
        index_page(&f.store, f.site.id, "/a", "cat dog").await;

        let err = f
            .engine
            .search("dog", Some("https://empty.org"), 0, 20)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn hit_carries_title_from_stored_content() {
        let f = fixture().await;
        index_page(&f.store, f.site.id, "/a", "cat dog").await;

        let outcome = f.engine.search("dog", None, 0, 20).await.unwrap();
        assert_eq!(outcome.hits[0].title, "/a");
    }

    #[test]
    fn title_extraction_handles_missing_markers() {
        assert_eq!(extract_title("<title>Hello</title>"), "Hello");
        assert_eq!(extract_title("no markers"), "");
        assert_eq!(extract_title("<title>unterminated"), "");
    }
}
