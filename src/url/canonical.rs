use crate::{UrlError, UrlResult};
use url::Url;

/// Parses a URL string into its canonical absolute form
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed or relative
/// 2. Accept only `http` and `https` schemes
/// 3. Require a host
/// 4. Drop the fragment (a fragment never changes what is fetched)
///
/// Everything else is left to the URL parser itself, which already lowercases
/// the scheme and host, strips default ports, removes dot segments and turns an
/// empty path into `/`.
///
/// # Examples
///
/// ```
/// use ripple_crawl::url::canonicalize;
///
/// let url = canonicalize("HTTP://Example.COM:80/a/../b#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/b");
/// ```
pub fn canonicalize(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str.trim())?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::UnsupportedScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    Ok(url)
}

/// Resolves an `href` attribute value against the URL of the page it came from
///
/// Uses standard base-relative reference resolution. Returns `None` when the
/// reference cannot be resolved; callers drop such links silently.
pub fn resolve_href(base: &Url, href: &str) -> Option<String> {
    base.join(href.trim()).ok().map(String::from)
}
