//! HTTP fetcher implementation
//!
//! This module handles all network access for the crawler:
//! - Building the HTTP client with the configured user agent and timeout
//! - The `Fetcher` capability fetch tasks use to GET a URL
//! - Turning the response body into a stream of byte chunks
//!
//! Status codes are deliberately not interpreted: an error page still has a
//! body, and that body is scanned like any other.

use crate::config::Config;
use crate::CrawlError;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Response body delivered chunk by chunk
pub type ByteStream = BoxStream<'static, Result<Bytes, CrawlError>>;

/// GET capability used by fetch tasks
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issues a GET for `url` and returns its body as a byte stream
    async fn fetch(&self, url: &Url) -> Result<ByteStream, CrawlError>;
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed by the client itself; a request timeout is only set
/// when one is configured.
///
/// # Example
///
/// ```no_run
/// use ripple_crawl::config::Config;
/// use ripple_crawl::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.header_value())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true);

    if let Some(timeout) = config.crawler.request_timeout() {
        builder = builder.timeout(timeout);
    }

    builder.build()
}

/// [`Fetcher`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a client built from `config`
    pub fn new(config: &Config) -> Result<Self, CrawlError> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<ByteStream, CrawlError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| CrawlError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url = %url, status = status.as_u16(), "non-success status, scanning body anyway");
        }

        let url_str = url.to_string();
        let stream = response.bytes_stream().map(move |chunk| {
            chunk.map_err(|source| CrawlError::Http {
                url: url_str.clone(),
                source,
            })
        });

        Ok(stream.boxed())
    }
}
