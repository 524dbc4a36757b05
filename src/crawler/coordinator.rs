//! Crawler coordinator - the single authority over what has been scheduled
//!
//! The coordinator runs as one tokio task draining an unbounded inbox. It is
//! the only owner of the seen-set and the active-task registry, and it handles
//! one message start to finish before looking at the next, so the
//! "insert into seen-set, then spawn" step can never race with itself.
//!
//! Completion is detected by counting in-flight fetch tasks: every task sends
//! its batch (if any) and then `Stopped`, so once the count drops back to zero
//! nothing can schedule further work.

use crate::config::{validate, Config, CrawlerConfig};
use crate::crawler::fetch_task::FetchTask;
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::messages::{CoordinatorMessage, LinkBatch, TaskId, TaskOutcome};
use crate::crawler::sink::PageSink;
use crate::output::CrawlSummary;
use crate::state::CoordinatorState;
use crate::url::canonicalize;
use crate::{CrawlError, UrlError};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinSet;

/// Main crawler coordinator structure
pub struct Coordinator {
    state: CoordinatorState,

    /// Canonical URL -> scheduled. Entries are never removed.
    seen: HashMap<String, bool>,

    /// Task -> alive. Bookkeeping only; dedup does not depend on it.
    active: HashMap<TaskId, bool>,

    next_task_id: u64,
    inbox: UnboundedReceiver<CoordinatorMessage>,
    outbox: UnboundedSender<CoordinatorMessage>,
    tasks: JoinSet<()>,
    fetcher: Arc<dyn Fetcher>,
    limiter: Option<Arc<Semaphore>>,
    scan_limit: Option<usize>,
    idle_waiters: Vec<oneshot::Sender<CrawlSummary>>,
    counters: Counters,
    started_at: Instant,
}

#[derive(Debug, Default)]
struct Counters {
    succeeded: u64,
    failed: u64,
    aborted: u64,
    links_received: u64,
    malformed: u64,
    unsupported: u64,
    duplicates: u64,
}

impl Coordinator {
    /// Creates a coordinator and the handle used to talk to it
    ///
    /// The coordinator does nothing until [`Coordinator::run`] is polled; use
    /// [`Coordinator::spawn`] to do both at once.
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &CrawlerConfig) -> (Self, CoordinatorHandle) {
        let (outbox, inbox) = mpsc::unbounded_channel();
        let limiter = config
            .concurrency_cap()
            .map(|cap| Arc::new(Semaphore::new(cap)));

        let coordinator = Self {
            state: CoordinatorState::Idle,
            seen: HashMap::new(),
            active: HashMap::new(),
            next_task_id: 0,
            inbox,
            outbox: outbox.clone(),
            tasks: JoinSet::new(),
            fetcher,
            limiter,
            scan_limit: config.scan_memory_limit(),
            idle_waiters: Vec::new(),
            counters: Counters::default(),
            started_at: Instant::now(),
        };

        (coordinator, CoordinatorHandle { sender: outbox })
    }

    /// Creates a coordinator, runs it on the current tokio runtime and returns
    /// its handle
    pub fn spawn(fetcher: Arc<dyn Fetcher>, config: &CrawlerConfig) -> CoordinatorHandle {
        let (coordinator, handle) = Self::new(fetcher, config);
        tokio::spawn(coordinator.run());
        handle
    }

    /// Processes inbox messages until shutdown
    ///
    /// The coordinator keeps its own sender for the tasks it spawns, so the
    /// inbox never closes on its own; only a `Shutdown` message ends the loop.
    pub async fn run(mut self) {
        tracing::info!(state = %self.state, "coordinator started");

        while self.state.is_running() {
            let Some(message) = self.inbox.recv().await else {
                break;
            };
            match message {
                CoordinatorMessage::Visit(batch) => self.handle_link_batch(batch),
                CoordinatorMessage::Stopped { task, outcome } => {
                    self.handle_task_stopped(task, outcome)
                }
                CoordinatorMessage::WaitIdle(reply) => {
                    if self.active.is_empty() {
                        let _ = reply.send(self.summary());
                    } else {
                        self.idle_waiters.push(reply);
                    }
                }
                CoordinatorMessage::Snapshot(reply) => {
                    let _ = reply.send(self.summary());
                }
                CoordinatorMessage::Shutdown(reply) => {
                    self.inbox.close();
                    self.shutdown();
                    let _ = reply.send(self.summary());
                }
            }
        }

        tracing::info!(
            state = %self.state,
            scheduled = self.seen.len(),
            elapsed_ms = self.started_at.elapsed().as_millis() as u64,
            "coordinator stopped"
        );
    }

    /// Schedules every unseen URL of `batch`, in batch order
    fn handle_link_batch(&mut self, batch: LinkBatch) {
        let next = self.state.on_batch();
        if next != self.state {
            tracing::debug!(from = %self.state, to = %next, "coordinator state changed");
            self.state = next;
        }
        self.counters.links_received += batch.len() as u64;

        for link in &batch.links {
            let url = match canonicalize(link) {
                Ok(url) => url,
                Err(UrlError::UnsupportedScheme(scheme)) => {
                    tracing::debug!(link = %link, scheme = %scheme, "skipping non-http link");
                    self.counters.unsupported += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!(link = %link, error = %e, "dropping malformed link");
                    self.counters.malformed += 1;
                    continue;
                }
            };

            match self.seen.entry(url.as_str().to_owned()) {
                Entry::Occupied(_) => {
                    tracing::trace!(url = %url, "already scheduled");
                    self.counters.duplicates += 1;
                }
                Entry::Vacant(slot) => {
                    slot.insert(true);
                    tracing::info!(url = %url, "visiting url");
                    self.spawn_fetch_task(url, Arc::clone(&batch.sink));
                }
            }
        }

        self.notify_if_idle();
    }

    fn spawn_fetch_task(&mut self, url: url::Url, sink: Arc<dyn PageSink>) {
        let id = TaskId::new(self.next_task_id);
        self.next_task_id += 1;
        self.active.insert(id, true);

        let task = FetchTask::new(
            id,
            url,
            self.outbox.clone(),
            sink,
            Arc::clone(&self.fetcher),
            self.limiter.clone(),
            self.scan_limit,
        );
        self.tasks.spawn(task.run());
    }

    fn handle_task_stopped(&mut self, task: TaskId, outcome: TaskOutcome) {
        if self.active.remove(&task).is_none() {
            tracing::warn!(task = %task, "stop reported by unknown task");
            return;
        }

        match outcome {
            TaskOutcome::Succeeded { .. } => self.counters.succeeded += 1,
            TaskOutcome::Failed => self.counters.failed += 1,
            TaskOutcome::Aborted => self.counters.aborted += 1,
        }

        self.reap_finished_tasks();
        self.notify_if_idle();
    }

    fn reap_finished_tasks(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            if let Err(e) = result {
                if e.is_panic() {
                    tracing::error!(error = %e, "fetch task panicked");
                }
            }
        }
    }

    fn notify_if_idle(&mut self) {
        if !self.active.is_empty() || self.idle_waiters.is_empty() {
            return;
        }

        tracing::info!(scheduled = self.seen.len(), "crawl reached a fixed point");
        let summary = self.summary();
        for waiter in self.idle_waiters.drain(..) {
            let _ = waiter.send(summary.clone());
        }
    }

    fn shutdown(&mut self) {
        if !self.active.is_empty() {
            tracing::warn!(in_flight = self.active.len(), "aborting in-flight fetch tasks");
        }
        self.tasks.abort_all();
        // Aborted tasks report through the inbox we are about to drop
        self.counters.aborted += self.active.len() as u64;
        self.active.clear();
        self.state = CoordinatorState::Stopped;

        let summary = self.summary();
        for waiter in self.idle_waiters.drain(..) {
            let _ = waiter.send(summary.clone());
        }
    }

    fn summary(&self) -> CrawlSummary {
        CrawlSummary {
            seen: self.seen.keys().cloned().collect(),
            tasks_spawned: self.next_task_id,
            tasks_succeeded: self.counters.succeeded,
            tasks_failed: self.counters.failed,
            tasks_aborted: self.counters.aborted,
            in_flight: self.active.len() as u64,
            links_received: self.counters.links_received,
            malformed_links: self.counters.malformed,
            unsupported_links: self.counters.unsupported,
            duplicate_links: self.counters.duplicates,
            elapsed: self.started_at.elapsed(),
        }
    }
}

/// Cloneable handle for sending work to a running coordinator
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    sender: UnboundedSender<CoordinatorMessage>,
}

impl CoordinatorHandle {
    /// Delivers `links` as one link batch whose pages go to `sink`
    pub fn visit<I, S>(&self, links: I, sink: Arc<dyn PageSink>) -> Result<(), CrawlError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.send(CoordinatorMessage::Visit(LinkBatch::new(links, sink)))
    }

    /// Waits until no fetch task is in flight
    ///
    /// Messages are handled in order, so batches sent through this handle
    /// before calling `wait_idle` are always scheduled before the check.
    pub async fn wait_idle(&self) -> Result<CrawlSummary, CrawlError> {
        self.request(CoordinatorMessage::WaitIdle).await
    }

    /// Returns the current counters without waiting
    pub async fn snapshot(&self) -> Result<CrawlSummary, CrawlError> {
        self.request(CoordinatorMessage::Snapshot).await
    }

    /// Aborts in-flight tasks, stops the coordinator and returns the final
    /// counters
    pub async fn shutdown(&self) -> Result<CrawlSummary, CrawlError> {
        self.request(CoordinatorMessage::Shutdown).await
    }

    fn send(&self, message: CoordinatorMessage) -> Result<(), CrawlError> {
        self.sender
            .send(message)
            .map_err(|_| CrawlError::CoordinatorClosed)
    }

    async fn request<F>(&self, make: F) -> Result<CrawlSummary, CrawlError>
    where
        F: FnOnce(oneshot::Sender<CrawlSummary>) -> CoordinatorMessage,
    {
        let (reply, response) = oneshot::channel();
        self.send(make(reply))?;
        response.await.map_err(|_| CrawlError::CoordinatorClosed)
    }
}

/// Runs a complete crawl over HTTP
///
/// Validates `config`, starts a coordinator, delivers `seeds` as the first
/// link batch, waits for the crawl to reach a fixed point and shuts the
/// coordinator down.
///
/// # Example
///
/// ```no_run
/// use ripple_crawl::config::Config;
/// use ripple_crawl::crawler::{crawl, StdoutSink};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let summary = crawl(
///     &Config::default(),
///     vec!["https://example.com/".to_string()],
///     Arc::new(StdoutSink),
/// )
/// .await?;
/// println!("fetched {} pages", summary.tasks_succeeded);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(
    config: &Config,
    seeds: Vec<String>,
    sink: Arc<dyn PageSink>,
) -> Result<CrawlSummary, CrawlError> {
    validate(config)?;
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(config)?);
    let handle = Coordinator::spawn(fetcher, &config.crawler);

    handle.visit(seeds, sink)?;
    handle.wait_idle().await?;
    handle.shutdown().await
}
