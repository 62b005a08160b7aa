//! HTML parsing for rendered documents
//!
//! Engines hand the serialized DOM to these helpers to pull out followable
//! anchors and a fallback title.

use crate::url::resolve_link;
use scraper::{Html, Selector};

/// Schemes that never lead to a renderable page
const IGNORED_SCHEMES: [&str; 4] = ["javascript:", "mailto:", "tel:", "data:"];

/// Extracts raw `href` values of followable anchors
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
///
/// The values are returned as written in the document. Use
/// [`extract_resolved_links`] to get absolute URLs.
///
/// # Example
///
/// ```
/// use sitepdf::engine::extract_anchor_hrefs;
///
/// let html = r#"<a href="/a">A</a><a href="mailto:x@y.z">mail</a>"#;
/// assert_eq!(extract_anchor_hrefs(html), vec!["/a".to_string()]);
/// ```
pub fn extract_anchor_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            // Skip if it has the download attribute
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if is_followable(href) {
                    links.push(href.trim().to_string());
                }
            }
        }
    }

    links
}

/// Followable anchors resolved to absolute URLs
///
/// Relative hrefs are resolved the way a browser resolves `a.href`: against
/// the first `<base href>` of the document, itself resolved against
/// `document_url`, or against `document_url` when there is none. Links that
/// resolve to a non-web scheme are dropped.
///
/// # Example
///
/// ```
/// use sitepdf::engine::extract_resolved_links;
///
/// let html = r#"<a href="intro">Intro</a>"#;
/// assert_eq!(
///     extract_resolved_links(html, "https://example.com/docs/"),
///     vec!["https://example.com/docs/intro".to_string()]
/// );
/// ```
pub fn extract_resolved_links(html: &str, document_url: &str) -> Vec<String> {
    let base = base_href(html)
        .and_then(|href| resolve_link(&href, document_url))
        .unwrap_or_else(|| document_url.to_string());

    extract_anchor_hrefs(html)
        .iter()
        .filter_map(|href| resolve_link(href, &base))
        .collect()
}

fn base_href(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("base[href]").ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
}

/// Extracts the trimmed `<title>` text, if any
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn is_followable(href: &str) -> bool {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return false;
    }

    let lower = href.to_ascii_lowercase();
    !IGNORED_SCHEMES
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}
