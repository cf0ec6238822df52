//! Recursive fan-out/fan-in site crawler.
//!
//! One task processes one URL: fetch, persist, index, then fork a child
//! task per newly discovered valid link and join them all before
//! returning. Fan-out width is exactly the number of new valid links per
//! page; there is no work queue and no explicit depth bound.

mod context;
mod extract;
mod fetch;

pub use context::CrawlContext;
pub use extract::{clean_document, extract_links};
pub use fetch::{FetchedPage, PageFetcher};

use std::sync::Arc;

use futures::future::BoxFuture;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::indexer::Indexer;
use crate::lemmatizer::TextNormalizer;
use crate::models::Site;
use crate::repository::IndexStore;

/// Binary/static file extensions never worth fetching.
const STATIC_EXTENSIONS: &str = r"(?i)\.(yml|yaml|nc|eps|ws|sql|png|jpeg|jpg|gif|webp|bmp|svg|ico|webm|ogg|oga|p3|mav|pdf|doc|docx|xls|xlsx|ppt|pptx|txt|rtf|zip|rar|7z|tgz|js|css|xml|json|woff|woff2|ttf|otf|apk|exe|bin)$";

/// Crawl task state for one site's subtree.
pub struct Crawler {
    site: Site,
    store: Arc<IndexStore>,
    indexer: Arc<Indexer>,
    normalizer: Arc<TextNormalizer>,
    fetcher: Arc<PageFetcher>,
    ctx: Arc<CrawlContext>,
    denylist: Regex,
}

impl Crawler {
    pub fn new(
        site: Site,
        store: Arc<IndexStore>,
        indexer: Arc<Indexer>,
        normalizer: Arc<TextNormalizer>,
        fetcher: Arc<PageFetcher>,
        ctx: Arc<CrawlContext>,
    ) -> Arc<Self> {
        Arc::new(Self {
            site,
            store,
            indexer,
            normalizer,
            fetcher,
            ctx,
            denylist: Regex::new(STATIC_EXTENSIONS).expect("valid denylist pattern"),
        })
    }

    /// Crawl the whole site starting at its root URL. Returns the first
    /// error recorded anywhere in the subtree, `Cancelled` included.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let root = self.site.url.clone();
        self.ctx.try_visit(&root);
        let body = self.process_page(&root).await?;
        Arc::clone(&self).crawl(root, body).await
    }

    /// Process the links of an already-fetched page and fork children.
    fn crawl(self: Arc<Self>, page_url: String, body: String) -> BoxFuture<'static, Result<()>> {
        Box::pin(async move {
            if self.ctx.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            let links = extract_links(&body, &page_url);
            let mut children = Vec::new();
            let mut outcome = Ok(());

            for link in links {
                if self.ctx.is_cancelled() {
                    // Abandon remaining links; already-forked children
                    // observe the flag on their own and unwind.
                    outcome = Err(EngineError::Cancelled);
                    break;
                }
                if !self.is_valid(&link) {
                    continue;
                }
                if !self.ctx.try_visit(&link) {
                    // Another task claimed this URL first.
                    continue;
                }
                match self.process_page(&link).await {
                    Ok(child_body) => {
                        let crawler = Arc::clone(&self);
                        children.push(tokio::spawn(crawler.crawl(link, child_body)));
                    }
                    Err(EngineError::Cancelled) => {
                        outcome = Err(EngineError::Cancelled);
                        break;
                    }
                    Err(err) => {
                        // A failed page is local: siblings keep going, the
                        // site records the error.
                        warn!(url = %link, error = %err, "page fetch failed");
                        if outcome.is_ok() {
                            outcome = Err(err);
                        }
                    }
                }
            }

            // Join barrier: every forked child finishes before this task.
            for joined in futures::future::join_all(children).await {
                match joined {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        if outcome.is_ok() {
                            outcome = Err(err);
                        }
                    }
                    Err(join_err) => {
                        if outcome.is_ok() {
                            outcome = Err(EngineError::fetch(&page_url, join_err));
                        }
                    }
                }
            }
            outcome
        })
    }

    /// Fetch one URL, replace any prior page at its path, and index its
    /// cleaned text. Returns the raw body for link extraction.
    async fn process_page(&self, url: &str) -> Result<String> {
        if self.ctx.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let fetched = self.fetcher.fetch(url).await?;
        let path = self.strip_origin(url);

        // At most one live page per (site, path): unwind the old page's
        // index rows before its replacement is stored.
        if let Some(existing) = self.store.page_by_path(self.site.id, &path).await {
            self.indexer.remove_index_for_page(existing.id).await;
            self.store.delete_page(existing.id).await;
        }

        let page = self
            .store
            .insert_page(self.site.id, &path, fetched.code, &fetched.body)
            .await;
        if !page.is_error_status() {
            let text = clean_document(&fetched.body);
            let counts = self.normalizer.normalize(&text);
            self.indexer
                .index_page(&page, &counts, self.ctx.cancelled_flag())
                .await?;
        }
        debug!(url, code = fetched.code, "page stored");
        Ok(fetched.body)
    }

    /// A link is worth fetching iff it stays on this site's origin, was
    /// not visited yet, is not a static/binary file, and is not a bare
    /// fragment of the origin.
    fn is_valid(&self, link: &str) -> bool {
        if !link.starts_with(&self.site.url) {
            return false;
        }
        if self.denylist.is_match(link) {
            return false;
        }
        let stripped = &link[self.site.url.len()..];
        if stripped == "#" || stripped == "/#" {
            return false;
        }
        !self.ctx.has_visited(link)
    }

    fn strip_origin(&self, url: &str) -> String {
        origin_relative_path(&self.site.url, url)
    }
}

/// URL with the site origin stripped; the origin itself maps to `/`.
pub fn origin_relative_path(origin: &str, url: &str) -> String {
    let path = url.strip_prefix(origin).unwrap_or(url);
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}
