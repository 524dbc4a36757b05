//! In-memory fetcher and recording sink for unit tests

use crate::crawler::fetcher::{ByteStream, Fetcher};
use crate::crawler::sink::PageSink;
use crate::CrawlError;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{stream, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncReadExt};
use url::Url;

/// Serves canned pages; unknown URLs fail like an unreachable host
#[derive(Clone, Default)]
pub(crate) struct StaticFetcher {
    pages: Arc<HashMap<String, String>>,
    hanging: Arc<HashSet<String>>,
    panicking: Arc<HashSet<String>>,
    calls: Arc<Mutex<HashMap<String, usize>>>,
}

impl StaticFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(mut self, url: &str, html: &str) -> Self {
        Arc::make_mut(&mut self.pages).insert(url.to_string(), html.to_string());
        self
    }

    /// Registers a URL whose fetch never completes
    pub(crate) fn hanging(mut self, url: &str) -> Self {
        Arc::make_mut(&mut self.hanging).insert(url.to_string());
        self
    }

    /// Registers a URL whose fetch panics
    pub(crate) fn panicking(mut self, url: &str) -> Self {
        Arc::make_mut(&mut self.panicking).insert(url.to_string());
        self
    }

    pub(crate) fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &Url) -> Result<ByteStream, CrawlError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;

        if self.hanging.contains(url.as_str()) {
            std::future::pending::<()>().await;
        }
        if self.panicking.contains(url.as_str()) {
            panic!("fetcher exploded on {}", url);
        }

        match self.pages.get(url.as_str()) {
            Some(html) => {
                // Two chunks so tags can straddle a chunk boundary
                let bytes = Bytes::from(html.clone());
                let mid = bytes.len() / 2;
                let chunks = vec![Ok(bytes.slice(..mid)), Ok(bytes.slice(mid..))];
                Ok(stream::iter(chunks).boxed())
            }
            None => Err(CrawlError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no page for {}", url),
            ))),
        }
    }
}

/// Records the URL and body of every page it is given
#[derive(Default)]
pub(crate) struct CollectingSink {
    pages: Mutex<Vec<(String, Vec<u8>)>>,
    reject: bool,
}

impl CollectingSink {
    pub(crate) fn rejecting() -> Self {
        Self {
            pages: Mutex::default(),
            reject: true,
        }
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.pages
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub(crate) fn body(&self, url: &str) -> Option<Vec<u8>> {
        self.pages
            .lock()
            .unwrap()
            .iter()
            .find(|(u, _)| u == url)
            .map(|(_, body)| body.clone())
    }
}

#[async_trait]
impl PageSink for CollectingSink {
    async fn consume(
        &self,
        url: &Url,
        body: &mut (dyn AsyncRead + Unpin + Send),
    ) -> anyhow::Result<()> {
        let mut content = Vec::new();
        body.read_to_end(&mut content).await?;
        if self.reject {
            anyhow::bail!("sink rejected {}", url);
        }
        self.pages.lock().unwrap().push((url.to_string(), content));
        Ok(())
    }
}
