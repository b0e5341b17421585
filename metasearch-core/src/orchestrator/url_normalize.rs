//! URL normalisation for result deduplication.
//!
//! Canonicalises URLs so that equivalent pages (differing only in
//! query-parameter order, tracking parameters, fragments, default ports
//! or a trailing slash) compare as equal.

use url::Url;

/// Tracking query parameters that are stripped during normalisation.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "ref",
    "si",
    "feature",
];

/// Normalise a URL for deduplication comparison.
///
/// 1. Scheme and host are already lowercased by [`Url`]; the path is kept.
/// 2. Default ports (`:80` for HTTP, `:443` for HTTPS) are dropped.
/// 3. Trailing slashes are removed from the path unless it is exactly `"/"`.
/// 4. Known tracking parameters are stripped (keys compared case-insensitively).
/// 5. Remaining query parameters are sorted by key, then value.
/// 6. The fragment is removed.
///
/// # Examples
///
/// ```
/// use metasearch_core::orchestrator::url_normalize::normalize_url;
/// use url::Url;
///
/// let a = Url::parse("https://Example.COM/path/?b=2&a=1#section").unwrap();
/// let b = Url::parse("https://example.com/path?a=1&b=2").unwrap();
/// assert_eq!(normalize_url(&a), normalize_url(&b));
/// ```
pub fn normalize_url(url: &Url) -> String {
    let mut parsed = url.clone();
    parsed.set_fragment(None);

    if is_default_port(&parsed) {
        let _ = parsed.set_port(None);
    }

    let mut params: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.to_ascii_lowercase().as_str()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort();

    if params.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(params.iter());
    }

    let path = parsed.path().trim_end_matches('/').to_string();
    if path.is_empty() {
        parsed.set_path("/");
    } else {
        parsed.set_path(&path);
    }

    parsed.to_string()
}

/// Returns `true` if the URL spells out the default port for its scheme.
fn is_default_port(url: &Url) -> bool {
    matches!(
        (url.scheme(), url.port()),
        ("http", Some(80)) | ("https", Some(443))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str) -> String {
        normalize_url(&Url::parse(raw).expect("valid url"))
    }

    #[test]
    fn lowercases_scheme_and_host() {
        assert_eq!(norm("HTTPS://Example.COM/Path"), "https://example.com/Path");
    }

    #[test]
    fn removes_trailing_slash() {
        assert_eq!(norm("https://example.com/path/"), "https://example.com/path");
        assert_eq!(norm("https://example.com/path//"), "https://example.com/path");
    }

    #[test]
    fn preserves_root_slash() {
        assert_eq!(norm("https://example.com/"), "https://example.com/");
        assert_eq!(norm("https://example.com"), "https://example.com/");
    }

    #[test]
    fn default_ports_are_dropped() {
        // Url::parse already elides explicit default ports.
        assert_eq!(norm("http://example.com:80/path"), "http://example.com/path");
        assert_eq!(norm("https://example.com:443/path"), "https://example.com/path");
        assert_eq!(norm("https://example.com:8080/path"), "https://example.com:8080/path");
    }

    #[test]
    fn sorts_query_params() {
        assert_eq!(
            norm("https://example.com/search?z=1&a=2&m=3"),
            "https://example.com/search?a=2&m=3&z=1"
        );
    }

    #[test]
    fn removes_tracking_params() {
        assert_eq!(
            norm("https://example.com/page?q=rust&utm_source=google&FBCLID=abc&gclid=xyz"),
            "https://example.com/page?q=rust"
        );
    }

    #[test]
    fn removes_fragment() {
        assert_eq!(norm("https://example.com/page#section"), "https://example.com/page");
    }

    #[test]
    fn equivalent_urls_normalize_to_same_string() {
        assert_eq!(
            norm("https://Example.COM/path/?b=2&a=1&utm_medium=x#section"),
            norm("https://example.com/path?a=1&b=2")
        );
    }

    #[test]
    fn encoded_values_survive() {
        let a = norm("https://example.com/search?q=a%26b&lang=en");
        assert_eq!(a, "https://example.com/search?lang=en&q=a%26b");
    }
}
