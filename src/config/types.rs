use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for a crawl
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Seed URLs delivered to the coordinator as the first link batch
    #[serde(default)]
    pub seeds: Vec<String>,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of fetch tasks allowed to hold a connection at once
    /// (0 = unbounded)
    #[serde(rename = "max-concurrent-fetches", default)]
    pub max_concurrent_fetches: u32,

    /// Per-request timeout in milliseconds (0 = no timeout)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Memory the link scanner may use for its tag buffer and open-element
    /// stack, in bytes (0 = unlimited). Pages exceeding it fail extraction.
    #[serde(rename = "scan-memory-limit-bytes", default)]
    pub scan_memory_limit_bytes: usize,
}

impl CrawlerConfig {
    /// Returns the request timeout, or `None` when timeouts are disabled
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }

    /// Returns the concurrency cap, or `None` when fan-out is unbounded
    pub fn concurrency_cap(&self) -> Option<usize> {
        (self.max_concurrent_fetches > 0).then_some(self.max_concurrent_fetches as usize)
    }

    /// Returns the scanner memory limit, or `None` when unlimited
    pub fn scan_memory_limit(&self) -> Option<usize> {
        (self.scan_memory_limit_bytes > 0).then_some(self.scan_memory_limit_bytes)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 0,
            request_timeout_ms: default_request_timeout_ms(),
            scan_memory_limit_bytes: 0,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_crawler_name() -> String {
    "RippleCrawl".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
