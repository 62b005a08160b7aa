use url::Url;

/// Extracts the domain key used for same-site filtering
///
/// The key is the lowercase host, followed by `:port` when the URL carries an
/// explicit non-default port. Strings the `url` crate cannot parse fall back to
/// the authority text between `://` and the next `/`, `?` or `#`, without userinfo.
///
/// # Returns
///
/// * `Some(String)` - The lowercase domain key
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use sitepdf::url::extract_domain;
///
/// assert_eq!(extract_domain("https://EXAMPLE.COM/path"), Some("example.com".to_string()));
/// assert_eq!(extract_domain("http://localhost:8080/"), Some("localhost:8080".to_string()));
/// assert_eq!(extract_domain("mailto:someone@example.com"), None);
/// ```
pub fn extract_domain(url: &str) -> Option<String> {
    match Url::parse(url) {
        Ok(parsed) => {
            let host = parsed.host_str()?.to_lowercase();
            if host.is_empty() {
                return None;
            }
            Some(match parsed.port() {
                Some(port) => format!("{}:{}", host, port),
                None => host,
            })
        }
        Err(_) => {
            let (_, rest) = url.split_once("://")?;
            let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
            let authority = &rest[..end];
            let host = authority
                .rsplit_once('@')
                .map(|(_, host)| host)
                .unwrap_or(authority);
            if host.is_empty() {
                None
            } else {
                Some(host.to_lowercase())
            }
        }
    }
}

/// Returns true for URLs the crawler can render (http and https)
pub fn is_web_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
