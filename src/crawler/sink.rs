//! Page sinks: consumers of the raw content of every fetched page

use async_trait::async_trait;
use bytes::Bytes;
use std::io::Write;
use tokio::io::{AsyncRead, AsyncReadExt};
use url::Url;

/// Consumer of fetched page content
///
/// One sink is shared by every fetch task of a crawl. It is invoked once per
/// successfully fetched page with a reader over that page's complete raw body.
/// Returning an error marks the page as failed: its links are not reported.
#[async_trait]
pub trait PageSink: Send + Sync {
    async fn consume(
        &self,
        url: &Url,
        body: &mut (dyn AsyncRead + Unpin + Send),
    ) -> anyhow::Result<()>;
}

/// Prints every page to stdout between separator lines
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

const SEPARATOR: &str = "==========================";

#[async_trait]
impl PageSink for StdoutSink {
    async fn consume(
        &self,
        _url: &Url,
        body: &mut (dyn AsyncRead + Unpin + Send),
    ) -> anyhow::Result<()> {
        let mut content = Vec::new();
        body.read_to_end(&mut content).await?;

        // Hold the lock for the whole page so concurrent pages don't interleave
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "{}", SEPARATOR)?;
        writeln!(out, "{}", String::from_utf8_lossy(&content))?;
        writeln!(out, "{}", SEPARATOR)?;
        out.flush()?;
        Ok(())
    }
}

/// Reads every page fully and throws it away
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

#[async_trait]
impl PageSink for DiscardSink {
    async fn consume(
        &self,
        _url: &Url,
        body: &mut (dyn AsyncRead + Unpin + Send),
    ) -> anyhow::Result<()> {
        tokio::io::copy(body, &mut tokio::io::sink()).await?;
        Ok(())
    }
}

/// Adapts a closure over the fully read page into a [`PageSink`]
pub struct FnSink<F>(F);

/// Wraps `f` so it can be used as a sink
///
/// # Example
///
/// ```
/// use ripple_crawl::crawler::sink_fn;
///
/// let sink = sink_fn(|url, body| {
///     println!("{} ({} bytes)", url, body.len());
///     Ok(())
/// });
/// # let _ = sink;
/// ```
pub fn sink_fn<F>(f: F) -> FnSink<F>
where
    F: Fn(&Url, Bytes) -> anyhow::Result<()> + Send + Sync,
{
    FnSink(f)
}

#[async_trait]
impl<F> PageSink for FnSink<F>
where
    F: Fn(&Url, Bytes) -> anyhow::Result<()> + Send + Sync,
{
    async fn consume(
        &self,
        url: &Url,
        body: &mut (dyn AsyncRead + Unpin + Send),
    ) -> anyhow::Result<()> {
        let mut content = Vec::new();
        body.read_to_end(&mut content).await?;
        (self.0)(url, Bytes::from(content))
    }
}
