//! Paced HTTP fetching.

use std::time::Duration;

use reqwest::Client;

use crate::config::CrawlConfig;
use crate::error::{EngineError, Result};

/// Status and raw body of one fetched URL.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub code: u16,
    pub body: String,
}

/// HTTP client wrapper enforcing a fixed delay in front of every fetch so
/// crawl workers never hammer the target.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
    delay: Duration,
}

impl PageFetcher {
    pub fn new(config: &CrawlConfig) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            delay: config.request_delay(),
        }
    }

    /// Fetch one URL. Non-2xx statuses are not errors here; the caller
    /// decides what an error-class status means for indexing.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        tokio::time::sleep(self.delay).await;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EngineError::fetch(url, e))?;
        let code = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| EngineError::fetch(url, e))?;
        Ok(FetchedPage { code, body })
    }
}
