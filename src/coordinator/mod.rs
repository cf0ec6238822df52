//! Run orchestration across all configured sites.
//!
//! The coordinator is the state machine of an indexing run: it owns the
//! per-run [`CrawlContext`], resets the store, spawns one root crawl task
//! per site, and records each site's outcome independently.

use std::sync::{Arc, Mutex};

use tracing::info;

use crate::config::Settings;
use crate::crawler::{clean_document, origin_relative_path, CrawlContext, Crawler, PageFetcher};
use crate::error::{EngineError, Result};
use crate::indexer::Indexer;
use crate::lemmatizer::TextNormalizer;
use crate::models::{Site, SiteStatus};
use crate::repository::IndexStore;

/// Lifecycle of the one indexing run the process may have in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    /// Stop requested; root tasks are draining.
    Stopping,
}

struct Inner {
    state: RunState,
    /// Context of the active run, kept so `stop_indexing` can reach its
    /// cancellation flag.
    ctx: Option<Arc<CrawlContext>>,
}

pub struct CrawlCoordinator {
    settings: Settings,
    store: Arc<IndexStore>,
    indexer: Arc<Indexer>,
    normalizer: Arc<TextNormalizer>,
    fetcher: Arc<PageFetcher>,
    inner: Mutex<Inner>,
}

impl CrawlCoordinator {
    pub fn new(settings: Settings, store: Arc<IndexStore>) -> Arc<Self> {
        let fetcher = Arc::new(PageFetcher::new(&settings.crawl));
        let indexer = Arc::new(Indexer::new(Arc::clone(&store)));
        Arc::new(Self {
            settings,
            store,
            indexer,
            normalizer: Arc::new(TextNormalizer::new()),
            fetcher,
            inner: Mutex::new(Inner {
                state: RunState::Idle,
                ctx: None,
            }),
        })
    }

    pub fn state(&self) -> RunState {
        self.inner.lock().expect("coordinator lock poisoned").state
    }

    /// Derived overall status; external callers use it to reject
    /// concurrent start attempts.
    pub fn is_running(&self) -> bool {
        self.state() != RunState::Idle
    }

    /// Launch a full indexing run in the background. Fails with `Busy`
    /// while a run is in progress or a stop is draining.
    pub async fn start_indexing(self: &Arc<Self>) -> Result<()> {
        let ctx = self.begin_run()?;
        self.store.reset().await;
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            coordinator.run_all_sites(ctx).await;
        });
        Ok(())
    }

    /// Run a full indexing pass to completion. Used by the CLI.
    pub async fn run_once(self: &Arc<Self>) -> Result<()> {
        let ctx = self.begin_run()?;
        self.store.reset().await;
        self.run_all_sites(ctx).await;
        Ok(())
    }

    /// Signal cooperative cancellation. Advisory: in-flight fetches are
    /// not interrupted, but no new fetch starts once the flag is seen.
    pub fn stop_indexing(&self) -> Result<()> {
        let mut inner = self.inner.lock().expect("coordinator lock poisoned");
        match inner.state {
            RunState::Idle => Err(EngineError::NotRunning),
            RunState::Running => {
                if let Some(ctx) = &inner.ctx {
                    ctx.cancel();
                }
                inner.state = RunState::Stopping;
                info!("stop requested, waiting for crawl tasks to drain");
                Ok(())
            }
            RunState::Stopping => Ok(()),
        }
    }

    /// Re-fetch and re-index one page without link discovery.
    ///
    /// Occupies the run state machine for its whole duration: a full run
    /// started mid-reindex would reset the store underneath the page
    /// being written.
    pub async fn reindex_page(&self, url: &str) -> Result<()> {
        let cfg = self.settings.site_for_url(url).cloned().ok_or_else(|| {
            EngineError::Validation(
                "the url is outside the sites listed in the configuration".to_string(),
            )
        })?;
        let ctx = self.begin_run()?;

        let site = match self.store.site_by_url(&cfg.url).await {
            Some(site) => {
                self.store
                    .set_site_status(site.id, SiteStatus::Indexing, None)
                    .await;
                site
            }
            None => self.store.insert_site(&cfg.url, &cfg.name).await,
        };

        let outcome = self.reindex_one(&site, url, &ctx).await;
        match &outcome {
            Ok(()) => {
                self.store
                    .set_site_status(site.id, SiteStatus::Indexed, None)
                    .await;
                info!(url, "page reindexed");
            }
            Err(err) => {
                self.store
                    .set_site_status(site.id, SiteStatus::Failed, Some(err.to_string()))
                    .await;
            }
        }
        self.finish_run();
        outcome
    }

    fn begin_run(&self) -> Result<Arc<CrawlContext>> {
        let mut inner = self.inner.lock().expect("coordinator lock poisoned");
        if inner.state != RunState::Idle {
            return Err(EngineError::Busy);
        }
        let ctx = Arc::new(CrawlContext::new());
        inner.state = RunState::Running;
        inner.ctx = Some(Arc::clone(&ctx));
        Ok(ctx)
    }

    fn finish_run(&self) {
        let mut inner = self.inner.lock().expect("coordinator lock poisoned");
        inner.state = RunState::Idle;
        inner.ctx = None;
    }

    /// Crawl every configured site concurrently and record per-site
    /// outcomes. Site failures never leak into each other.
    async fn run_all_sites(&self, ctx: Arc<CrawlContext>) {
        let mut roots = Vec::new();
        for cfg in &self.settings.sites {
            let site = self.store.insert_site(&cfg.url, &cfg.name).await;
            info!(url = %site.url, "crawl started");
            let crawler = Crawler::new(
                site.clone(),
                Arc::clone(&self.store),
                Arc::clone(&self.indexer),
                Arc::clone(&self.normalizer),
                Arc::clone(&self.fetcher),
                Arc::clone(&ctx),
            );
            roots.push((site, tokio::spawn(crawler.run())));
        }

        for (site, handle) in roots {
            let outcome = match handle.await {
                Ok(result) => result,
                Err(join_err) => Err(EngineError::fetch(&site.url, join_err)),
            };
            match outcome {
                Ok(()) => {
                    self.store
                        .set_site_status(site.id, SiteStatus::Indexed, None)
                        .await;
                    info!(url = %site.url, "site indexed");
                }
                Err(err) => {
                    self.store
                        .set_site_status(site.id, SiteStatus::Failed, Some(err.to_string()))
                        .await;
                    info!(url = %site.url, error = %err, "site failed");
                }
            }
        }

        info!("indexing run finished");
        self.finish_run();
    }

    async fn reindex_one(&self, site: &Site, url: &str, ctx: &CrawlContext) -> Result<()> {
        let fetched = self.fetcher.fetch(url).await?;
        let path = origin_relative_path(&site.url, url);

        if let Some(existing) = self.store.page_by_path(site.id, &path).await {
            self.indexer.remove_index_for_page(existing.id).await;
            self.store.delete_page(existing.id).await;
        }

        let page = self
            .store
            .insert_page(site.id, &path, fetched.code, &fetched.body)
            .await;
        if !page.is_error_status() {
            let text = clean_document(&fetched.body);
            let counts = self.normalizer.normalize(&text);
            self.indexer
                .index_page(&page, &counts, ctx.cancelled_flag())
                .await?;
        }
        Ok(())
    }
}
