//! Messages exchanged between fetch tasks, callers and the coordinator

use crate::crawler::sink::PageSink;
use crate::output::CrawlSummary;
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Identity of a fetch task, assigned by the coordinator in spawn order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// An ordered list of discovered links together with the sink every page
/// fetched from them must be delivered to
#[derive(Clone)]
pub struct LinkBatch {
    pub links: Vec<String>,
    pub sink: Arc<dyn PageSink>,
}

impl LinkBatch {
    pub fn new<I, S>(links: I, sink: Arc<dyn PageSink>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            links: links.into_iter().map(Into::into).collect(),
            sink,
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl fmt::Debug for LinkBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkBatch")
            .field("links", &self.links)
            .finish_non_exhaustive()
    }
}

/// How a fetch task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The page was fetched, scanned and sunk; its links were reported
    Succeeded { links: usize },
    /// Fetch, extraction or sink failed; nothing was reported
    Failed,
    /// The task was cancelled or panicked before reaching a verdict
    Aborted,
}

/// Everything the coordinator's inbox accepts
#[derive(Debug)]
pub enum CoordinatorMessage {
    /// A batch of links to schedule
    Visit(LinkBatch),

    /// Final message of every fetch task, sent after its batch (if any)
    Stopped { task: TaskId, outcome: TaskOutcome },

    /// Reply once no fetch task is in flight
    WaitIdle(oneshot::Sender<CrawlSummary>),

    /// Reply immediately with the current counters
    Snapshot(oneshot::Sender<CrawlSummary>),

    /// Abort in-flight tasks, reply with the final counters and stop
    Shutdown(oneshot::Sender<CrawlSummary>),
}
