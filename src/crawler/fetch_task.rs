//! Fetch task: one short-lived unit of work per scheduled URL
//!
//! A task fetches its URL, scans the body for links while reading it, hands
//! the raw bytes to the sink and reports the links back to the coordinator as
//! a single batch. Any failure ends the task without a report. Either way the
//! last message the coordinator receives from a task is `Stopped`.

use crate::crawler::extractor::scan_stream;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::messages::{CoordinatorMessage, LinkBatch, TaskId, TaskOutcome};
use crate::crawler::sink::PageSink;
use crate::state::TaskState;
use crate::CrawlError;
use std::future::Future;
use std::io::Cursor;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Semaphore;
use url::Url;

pub(crate) struct FetchTask {
    id: TaskId,
    url: Url,
    state: TaskState,
    coordinator: UnboundedSender<CoordinatorMessage>,
    sink: Arc<dyn PageSink>,
    fetcher: Arc<dyn Fetcher>,
    limiter: Option<Arc<Semaphore>>,
    scan_limit: Option<usize>,
}

impl FetchTask {
    pub(crate) fn new(
        id: TaskId,
        url: Url,
        coordinator: UnboundedSender<CoordinatorMessage>,
        sink: Arc<dyn PageSink>,
        fetcher: Arc<dyn Fetcher>,
        limiter: Option<Arc<Semaphore>>,
        scan_limit: Option<usize>,
    ) -> Self {
        Self {
            id,
            url,
            state: TaskState::Started,
            coordinator,
            sink,
            fetcher,
            limiter,
            scan_limit,
        }
    }

    /// Runs the task to completion
    ///
    /// The stop guard is armed before the returned future is first polled, so
    /// a task cancelled before it ever ran still reports `Stopped`.
    pub(crate) fn run(mut self) -> impl Future<Output = ()> + Send {
        let guard = StopGuard {
            id: self.id,
            url: self.url.clone(),
            coordinator: self.coordinator.clone(),
            outcome: TaskOutcome::Aborted,
        };

        async move {
            // Rebind so the block owns the whole guard, not just its outcome
            let mut guard = guard;
            tracing::info!(task = %self.id, url = %self.url, "fetch task started");

            match self.visit().await {
                Ok(links) => {
                    let count = links.len();
                    let batch = LinkBatch::new(links, Arc::clone(&self.sink));
                    if self
                        .coordinator
                        .send(CoordinatorMessage::Visit(batch))
                        .is_err()
                    {
                        tracing::warn!(task = %self.id, "coordinator gone, links discarded");
                    }
                    self.finish(TaskState::Done);
                    guard.outcome = TaskOutcome::Succeeded { links: count };
                }
                Err(e) => {
                    tracing::error!(task = %self.id, url = %self.url, error = %e, "visit error");
                    self.finish(TaskState::Failed);
                    guard.outcome = TaskOutcome::Failed;
                }
            }
        }
    }

    /// Fetch, scan, sink. Returns the extracted links on success.
    async fn visit(&mut self) -> Result<Vec<String>, CrawlError> {
        self.state = self.state.transition(TaskState::Running)?;

        let permit = match &self.limiter {
            Some(limiter) => Some(
                Arc::clone(limiter)
                    .acquire_owned()
                    .await
                    .map_err(|_| CrawlError::CoordinatorClosed)?,
            ),
            None => None,
        };

        let stream = self.fetcher.fetch(&self.url).await?;
        let page = scan_stream(&self.url, self.scan_limit, stream).await?;
        drop(permit);

        tracing::debug!(
            task = %self.id,
            url = %self.url,
            bytes = page.body.len(),
            links = page.links.len(),
            "page scanned"
        );

        let mut body = Cursor::new(page.body);
        self.sink
            .consume(&self.url, &mut body)
            .await
            .map_err(|reason| CrawlError::Sink {
                url: self.url.to_string(),
                reason,
            })?;

        Ok(page.links)
    }

    fn finish(&mut self, next: TaskState) {
        match self.state.transition(next) {
            Ok(state) => self.state = state,
            Err(e) => tracing::warn!(task = %self.id, error = %e, "unexpected task state"),
        }
    }
}

/// Sends `Stopped` when the task ends, including by cancellation or panic
struct StopGuard {
    id: TaskId,
    url: Url,
    coordinator: UnboundedSender<CoordinatorMessage>,
    outcome: TaskOutcome,
}

impl Drop for StopGuard {
    fn drop(&mut self) {
        tracing::info!(task = %self.id, url = %self.url, outcome = ?self.outcome, "fetch task stopped");
        let _ = self.coordinator.send(CoordinatorMessage::Stopped {
            task: self.id,
            outcome: self.outcome,
        });
    }
}
