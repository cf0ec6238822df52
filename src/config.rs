//! Configuration loading for sitesearch.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Default delay in front of every network fetch, in milliseconds.
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 200;

/// Top-level settings, loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    /// Ordered list of sites to crawl; also the validation boundary for
    /// single-page reindexing.
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Fixed pacing delay before every fetch.
    pub request_delay_ms: u64,
    /// Per-request timeout.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            timeout_secs: 30,
            user_agent: format!("Mozilla/5.0 (compatible; sitesearch/{})", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CrawlConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// One crawl origin.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub url: String,
}

impl Settings {
    /// Load settings from a TOML file and normalize site URLs.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config {}: {}", path.display(), e))?;
        let mut settings: Settings = toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
        for site in &mut settings.sites {
            site.url = normalize_site_url(&site.url);
        }
        if settings.sites.is_empty() {
            tracing::warn!("no [[sites]] configured in {}", path.display());
        }
        Ok(settings)
    }

    /// The configured site owning `url`, if any.
    pub fn site_for_url(&self, url: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|s| url.starts_with(&s.url))
    }
}

/// Strip trailing slashes so origin-stripped paths always begin with `/`.
pub fn normalize_site_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let settings: Settings = toml::from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [crawl]
            request_delay_ms = 50

            [[sites]]
            name = "Example"
            url = "https://example.com"
            "#,
        )
        .unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.crawl.request_delay_ms, 50);
        assert_eq!(settings.crawl.timeout_secs, 30);
        assert_eq!(settings.sites.len(), 1);
    }

    #[test]
    fn site_lookup_respects_origin() {
        let settings = Settings {
            server: ServerConfig::default(),
            crawl: CrawlConfig::default(),
            sites: vec![SiteConfig {
                name: "Example".into(),
                url: "https://example.com".into(),
            }],
        };
        assert!(settings.site_for_url("https://example.com/a/b").is_some());
        assert!(settings.site_for_url("https://other.org/a").is_none());
    }

    #[test]
    fn normalizes_trailing_slash() {
        assert_eq!(normalize_site_url("https://example.com/"), "https://example.com");
        assert_eq!(normalize_site_url("https://example.com"), "https://example.com");
    }
}
