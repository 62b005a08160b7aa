//! URL handling module for sitepdf
//!
//! This module provides URL normalization, domain extraction and relative link
//! resolution for the single-domain crawl.

mod domain;
mod normalize;

use url::Url;

// Re-export main functions
pub use domain::{extract_domain, is_web_url};
pub use normalize::normalize_url;

/// Resolves a raw link against the page it was found on
///
/// Absolute links are returned as-is, relative links are joined onto `base_url`.
/// Links that resolve to a non-web scheme (`mailto:`, `javascript:`, ...) yield `None`.
///
/// # Examples
///
/// ```
/// use sitepdf::url::resolve_link;
///
/// let resolved = resolve_link("../b", "https://example.com/docs/a/").unwrap();
/// assert_eq!(resolved, "https://example.com/docs/b");
/// assert!(resolve_link("mailto:me@example.com", "https://example.com/").is_none());
/// ```
pub fn resolve_link(raw: &str, base_url: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let joined = match Url::parse(base_url) {
        Ok(base) => base.join(raw),
        Err(_) => Url::parse(raw),
    };

    match joined {
        Ok(url) if is_web_url(&url) => Some(url.to_string()),
        Ok(_) => None,
        Err(e) => {
            tracing::trace!("Could not resolve link {} against {}: {}", raw, base_url, e);
            None
        }
    }
}

/// Returns true if `url` belongs to `base_domain` after normalization
pub fn is_same_domain(url: &str, base_domain: &str) -> bool {
    extract_domain(&normalize_url(url))
        .map(|domain| domain == base_domain)
        .unwrap_or(false)
}
