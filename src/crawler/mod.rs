//! Crawler module: coordinator, fetch tasks and their collaborators
//!
//! - `coordinator`: the single owner of the seen-set; spawns fetch tasks
//! - `fetch_task`: fetches one URL, scans it, sinks it, reports its links
//! - `fetcher`: HTTP GET capability
//! - `extractor`: streaming `<a href>` scan over the response body
//! - `sink`: consumers of fetched page content
//! - `messages`: the coordinator's inbox protocol

mod coordinator;
mod extractor;
mod fetch_task;
mod fetcher;
mod messages;
mod sink;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{crawl, Coordinator, CoordinatorHandle};
pub use extractor::{scan_stream, LinkExtractor, ScannedPage};
pub use fetcher::{build_http_client, ByteStream, Fetcher, HttpFetcher};
pub use messages::{LinkBatch, TaskId, TaskOutcome};
pub use sink::{sink_fn, DiscardSink, FnSink, PageSink, StdoutSink};
