//! URL handling module for Ripple Crawl
//!
//! Canonicalization produces the dedup key the coordinator stores in its
//! seen-set; resolution turns an `href` into an absolute URL against the page
//! it was found on.

mod canonical;

pub use canonical::{canonicalize, resolve_href};
