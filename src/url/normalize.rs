use url::Url;

/// Normalizes a URL into the canonical key used by the frontier
///
/// # Normalization Steps
///
/// 1. Prepend `https://` when the input carries no http(s) scheme
/// 2. Lowercase the scheme and host
/// 3. Remove the fragment (everything after #)
/// 4. Remove trailing slashes from the path (the root stays `/`)
/// 5. Keep the query string as given
///
/// This never fails. Input the `url` crate refuses to parse is normalized with
/// plain string handling so the result is still a stable key.
///
/// # Examples
///
/// ```
/// use sitepdf::url::normalize_url;
///
/// assert_eq!(normalize_url("EXAMPLE.com/Docs/"), "https://example.com/Docs");
/// assert_eq!(normalize_url("https://example.com"), "https://example.com/");
/// assert_eq!(normalize_url("https://example.com/a?b=1#top"), "https://example.com/a?b=1");
/// ```
pub fn normalize_url(raw: &str) -> String {
    let with_scheme = ensure_scheme(raw.trim());

    match Url::parse(&with_scheme) {
        Ok(mut url) => {
            url.set_fragment(None);

            let path = strip_trailing_slash(url.path()).to_string();
            url.set_path(&path);

            url.to_string()
        }
        Err(e) => {
            tracing::trace!("Falling back to string normalization for {}: {}", raw, e);
            normalize_unparsed(&with_scheme)
        }
    }
}

/// Adds `https://` unless the string already starts with an http(s) scheme
fn ensure_scheme(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    }
}

/// Removes trailing slashes, keeping `/` for the root
fn strip_trailing_slash(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Best-effort normalization for strings the URL parser rejects
fn normalize_unparsed(with_scheme: &str) -> String {
    let without_fragment = with_scheme
        .split_once('#')
        .map(|(head, _)| head)
        .unwrap_or(with_scheme);

    let (scheme, rest) = without_fragment
        .split_once("://")
        .unwrap_or(("https", without_fragment));

    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);

    let (path, query) = match tail.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (tail, None),
    };

    let mut normalized = format!(
        "{}://{}{}",
        scheme.to_ascii_lowercase(),
        authority.to_lowercase(),
        strip_trailing_slash(path)
    );
    if let Some(query) = query {
        normalized.push('?');
        normalized.push_str(query);
    }
    normalized
}
