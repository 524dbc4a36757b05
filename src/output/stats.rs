//! Crawl summary produced by the coordinator

use std::collections::BTreeSet;
use std::time::Duration;

/// Counters and seen-set of a crawl at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Every canonical URL ever scheduled
    pub seen: BTreeSet<String>,

    /// Fetch tasks spawned (always equal to `seen.len()`)
    pub tasks_spawned: u64,

    /// Tasks that fetched, scanned and sunk their page
    pub tasks_succeeded: u64,

    /// Tasks that failed to fetch, scan or sink their page
    pub tasks_failed: u64,

    /// Tasks cancelled or panicked before reaching a verdict
    pub tasks_aborted: u64,

    /// Tasks still running when the summary was taken
    pub in_flight: u64,

    /// Links received in batches, seeds included
    pub links_received: u64,

    /// Links dropped because they could not be parsed as absolute URLs
    pub malformed_links: u64,

    /// Links skipped because their scheme is not http or https
    pub unsupported_links: u64,

    /// Links skipped because they were already scheduled
    pub duplicate_links: u64,

    /// Time since the coordinator started
    pub elapsed: Duration,
}

impl CrawlSummary {
    /// Returns true once every spawned task has stopped
    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Tasks:");
    println!("  Spawned: {}", summary.tasks_spawned);
    println!("  Succeeded: {}", summary.tasks_succeeded);
    println!("  Failed: {}", summary.tasks_failed);
    if summary.tasks_aborted > 0 {
        println!("  Aborted: {}", summary.tasks_aborted);
    }
    if !summary.is_idle() {
        println!("  Still running: {}", summary.in_flight);
    }
    println!();

    println!("Links:");
    println!("  Received: {}", summary.links_received);
    println!("  Already seen: {}", summary.duplicate_links);
    println!("  Malformed: {}", summary.malformed_links);
    println!("  Non-http: {}", summary.unsupported_links);
    println!();

    let secs = summary.elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        summary.tasks_spawned as f64 / secs
    } else {
        0.0
    };
    println!("Elapsed: {:.2}s ({:.2} pages/sec)", secs, rate);
}
