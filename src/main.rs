//! Ripple Crawl main entry point
//!
//! This is the command-line interface for the Ripple Crawl web crawler.

use anyhow::{bail, Context};
use clap::Parser;
use ripple_crawl::config::{load_config, validate, Config};
use ripple_crawl::crawler::{Coordinator, DiscardSink, Fetcher, HttpFetcher, PageSink, StdoutSink};
use ripple_crawl::output::print_summary;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Ripple Crawl: a concurrent breadth-first web crawler
///
/// Starting from the seed URLs, every reachable page is fetched exactly once
/// and printed to stdout. Logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "ripple-crawl")]
#[command(version)]
#[command(about = "A concurrent breadth-first web crawler", long_about = None)]
struct Cli {
    /// Seed URLs (added to any seeds from the config file)
    #[arg(value_name = "SEED")]
    seeds: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of simultaneous fetches (0 = unbounded)
    #[arg(long, value_name = "N")]
    max_concurrent: Option<u32>,

    /// Per-request timeout in milliseconds (0 = none)
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Read pages but don't print them
    #[arg(long)]
    discard: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    let mut seeds = cli.seeds.clone();
    seeds.extend(config.seeds.iter().cloned());
    if seeds.is_empty() {
        bail!("no seed URLs given (pass them as arguments or set `seeds` in the config file)");
    }

    tracing::info!(
        seeds = seeds.len(),
        max_concurrent = config.crawler.max_concurrent_fetches,
        timeout_ms = config.crawler.request_timeout_ms,
        "starting crawl"
    );

    let sink: Arc<dyn PageSink> = if cli.discard {
        Arc::new(DiscardSink)
    } else {
        Arc::new(StdoutSink)
    };

    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config)?);
    let handle = Coordinator::spawn(fetcher, &config.crawler);
    handle.visit(seeds, sink)?;

    tokio::select! {
        result = handle.wait_idle() => {
            result?;
            tracing::info!("crawl completed");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupt received, stopping crawl");
        }
    }

    let summary = handle.shutdown().await?;
    if !cli.quiet {
        print_summary(&summary);
    }

    Ok(())
}

/// Loads the config file (if any) and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(max) = cli.max_concurrent {
        config.crawler.max_concurrent_fetches = max;
    }
    if let Some(timeout) = cli.timeout_ms {
        config.crawler.request_timeout_ms = timeout;
    }

    validate(&config).context("invalid configuration")?;
    for seed in &cli.seeds {
        ripple_crawl::url::canonicalize(seed)
            .with_context(|| format!("invalid seed URL '{}'", seed))?;
    }

    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_crawl=info,warn"),
            1 => EnvFilter::new("ripple_crawl=debug,info"),
            2 => EnvFilter::new("ripple_crawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
