use crate::config::types::{Config, CrawlerConfig, UserAgentConfig};
use crate::url::canonicalize;
use crate::ConfigError;
use url::Url;

const MAX_REQUEST_TIMEOUT_MS: u64 = 10 * 60 * 1000;
const MAX_CONCURRENT_FETCHES: u32 = 10_000;
const MIN_SCAN_MEMORY_LIMIT_BYTES: usize = 16 * 1024;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_seeds(&config.seeds)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_fetches > MAX_CONCURRENT_FETCHES {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be at most {}, got {}",
            MAX_CONCURRENT_FETCHES, config.max_concurrent_fetches
        )));
    }

    if config.request_timeout_ms > MAX_REQUEST_TIMEOUT_MS {
        return Err(ConfigError::Validation(format!(
            "request_timeout_ms must be at most {}ms, got {}ms",
            MAX_REQUEST_TIMEOUT_MS, config.request_timeout_ms
        )));
    }

    if let Some(limit) = config.scan_memory_limit() {
        if limit < MIN_SCAN_MEMORY_LIMIT_BYTES {
            return Err(ConfigError::Validation(format!(
                "scan_memory_limit_bytes must be 0 or at least {}, got {}",
                MIN_SCAN_MEMORY_LIMIT_BYTES, limit
            )));
        }
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates seed URLs
///
/// Seeds must already be absolute http(s) URLs. Malformed links found while
/// crawling are only logged, but a malformed seed is a configuration mistake.
fn validate_seeds(seeds: &[String]) -> Result<(), ConfigError> {
    for seed in seeds {
        canonicalize(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;
    }
    Ok(())
}
