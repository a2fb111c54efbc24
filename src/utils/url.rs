//! URL normalization and page-type matching for the crawler.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

/// English-language path prefixes that alias the canonical page.
fn language_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^/(en|en-us|en-gb)/").expect("valid regex"))
}

/// Normalize a URL into the key used by the crawler's visited set.
///
/// Drops the fragment and query, collapses a trailing slash, strips
/// language prefixes, and keeps the scheme/host in lowercase (the `url`
/// crate already canonicalizes those on parse). URLs differing only in
/// these aspects normalize to the same key and are crawled once.
pub fn normalize_url(url: &Url) -> String {
    let mut path = language_prefix().replace(url.path(), "/").into_owned();
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }

    let mut normalized = format!("{}://", url.scheme());
    if let Some(host) = url.host_str() {
        normalized.push_str(host);
    }
    if let Some(port) = url.port() {
        normalized.push_str(&format!(":{}", port));
    }
    normalized.push_str(&path);
    normalized
}

/// Check whether a URL path falls under one of the page-type filters.
///
/// A filter names a top-level path section, e.g. `products` matches
/// `/products/...`. Filters may be given with or without slashes.
pub fn matches_page_type(url: &Url, page_types: &[String]) -> bool {
    if page_types.is_empty() {
        return true;
    }
    let path = url.path();
    page_types.iter().any(|page_type| {
        let section = page_type.trim_matches('/');
        !section.is_empty()
            && (path == format!("/{}", section)
                || path.starts_with(&format!("/{}/", section)))
    })
}
