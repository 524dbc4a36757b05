//! Streaming link extraction
//!
//! The response body is read exactly once. Every chunk is fed to a `lol_html`
//! rewriter that collects `<a href>` values and is appended to a retained
//! buffer, so the links and the raw bytes handed to the sink always come from
//! the same read pass.

use crate::url::resolve_href;
use crate::CrawlError;
use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use lol_html::send::{HtmlRewriter, Settings};
use lol_html::{element, MemorySettings, OutputSink};
use std::sync::{Arc, Mutex, PoisonError};
use url::Url;

/// Result of scanning one page
#[derive(Debug, Clone)]
pub struct ScannedPage {
    /// Absolute URLs of every resolvable anchor, in document order
    pub links: Vec<String>,

    /// The complete raw body
    pub body: Bytes,
}

/// Incremental `<a href>` scanner that also retains the bytes it was fed
pub struct LinkExtractor {
    base: Url,
    rewriter: HtmlRewriter<'static, NoopSink>,
    links: Arc<Mutex<Vec<String>>>,
    body: BytesMut,
}

impl LinkExtractor {
    /// Creates a scanner resolving relative links against `base`
    pub fn new(base: Url) -> Self {
        Self::with_memory_limit(base, None)
    }

    /// Like [`LinkExtractor::new`], but fails once the tokenizer needs more
    /// than `limit` bytes, e.g. to buffer a tag split across chunks
    pub fn with_memory_limit(base: Url, limit: Option<usize>) -> Self {
        let links = Arc::new(Mutex::new(Vec::new()));
        let links_handle = Arc::clone(&links);
        let handler_base = base.clone();

        let anchors = element!("a[href]", move |el| {
            if let Some(href) = el.get_attribute("href") {
                match resolve_href(&handler_base, &href) {
                    Some(link) => links_handle
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(link),
                    None => tracing::debug!(base = %handler_base, href = %href, "dropping unresolvable href"),
                }
            }
            Ok(())
        });

        let memory_settings = match limit {
            Some(max) => MemorySettings {
                preallocated_parsing_buffer_size: 0,
                max_allowed_memory_usage: max,
            },
            None => MemorySettings::default(),
        };

        let rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: vec![anchors],
                memory_settings,
                ..Settings::new_send()
            },
            NoopSink,
        );

        Self {
            base,
            rewriter,
            links,
            body: BytesMut::new(),
        }
    }

    /// Feeds the next chunk of the body
    pub fn write(&mut self, chunk: &[u8]) -> Result<(), CrawlError> {
        self.body.extend_from_slice(chunk);
        self.rewriter
            .write(chunk)
            .map_err(|e| self.extraction_error(e))
    }

    /// Signals end of input and returns the links and the retained body
    pub fn finish(self) -> Result<ScannedPage, CrawlError> {
        let Self {
            base,
            rewriter,
            links,
            body,
        } = self;

        rewriter.end().map_err(|e| CrawlError::Extraction {
            url: base.to_string(),
            message: e.to_string(),
        })?;

        let links = std::mem::take(&mut *links.lock().unwrap_or_else(PoisonError::into_inner));

        Ok(ScannedPage {
            links,
            body: body.freeze(),
        })
    }

    fn extraction_error(&self, e: lol_html::errors::RewritingError) -> CrawlError {
        CrawlError::Extraction {
            url: self.base.to_string(),
            message: e.to_string(),
        }
    }
}

/// Drains `stream` through a [`LinkExtractor`] for `base`
///
/// A transport error while reading the stream is returned as is; a tokenizer
/// error, including exceeding `memory_limit`, becomes
/// [`CrawlError::Extraction`].
pub async fn scan_stream<S>(
    base: &Url,
    memory_limit: Option<usize>,
    mut stream: S,
) -> Result<ScannedPage, CrawlError>
where
    S: Stream<Item = Result<Bytes, CrawlError>> + Unpin,
{
    let mut extractor = LinkExtractor::with_memory_limit(base.clone(), memory_limit);
    while let Some(chunk) = stream.next().await {
        extractor.write(&chunk?)?;
    }
    extractor.finish()
}

/// Output of the rewriter is never used; only the element handlers matter
struct NoopSink;

impl OutputSink for NoopSink {
    fn handle_chunk(&mut self, _chunk: &[u8]) {}
}
