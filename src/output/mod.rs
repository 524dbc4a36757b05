//! Output module for crawl results
//!
//! The coordinator keeps counters for everything it schedules; this module
//! defines the summary it hands back and how the CLI prints it.

mod stats;

pub use stats::{print_summary, CrawlSummary};
