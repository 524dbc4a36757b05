//! Configuration module for Ripple Crawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section has defaults, so a crawl can run without any file at all.
//!
//! # Example
//!
//! ```no_run
//! use ripple_crawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Seeds: {:?}", config.seeds);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
