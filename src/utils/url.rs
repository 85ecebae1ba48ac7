use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ARTICLE_URL: Regex = Regex::new(r"^https?://en\.wikipedia\.org/wiki/(.+)$").unwrap();
}

/// Page key of a canonical article URL, with fragment and query removed.
///
/// The key is returned as it appears in the URL; percent-decoding happens
/// when the key is resolved against a page store.
pub fn page_key_from_url(url: &str) -> Option<String> {
    let url = url.trim();
    let url = url.split('#').next().unwrap_or(url);
    let url = url.split('?').next().unwrap_or(url);

    ARTICLE_URL
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|key| key.as_str().to_string())
}
