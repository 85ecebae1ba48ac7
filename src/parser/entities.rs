// Character reference decoding for HTML text.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::borrow::Cow;

lazy_static! {
    pub(crate) static ref ENTITY: Regex = Regex::new(
        r"&(?:#([0-9]{1,7});?|#[xX]([0-9a-fA-F]{1,6});?|([A-Za-z][A-Za-z0-9]{1,31});)"
    ).unwrap();
}

/// Decodes numeric and named character references.
///
/// Unknown names are left untouched. Numeric references to NUL, surrogates
/// or values past U+10FFFF become U+FFFD.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if memchr::memchr(b'&', text.as_bytes()).is_none() {
        return Cow::Borrowed(text);
    }
    ENTITY.replace_all(text, |caps: &Captures| {
        resolve(caps).unwrap_or_else(|| caps[0].to_string())
    })
}

/// Decodes the reference starting at byte `pos`, returning the replacement
/// and the number of source bytes it consumed.
pub fn decode_entity_at(text: &str, pos: usize) -> Option<(String, usize)> {
    let caps = ENTITY.captures_at(text, pos)?;
    let whole = caps.get(0)?;
    if whole.start() != pos {
        return None;
    }
    resolve(&caps).map(|decoded| (decoded, whole.len()))
}

fn resolve(caps: &Captures) -> Option<String> {
    if let Some(dec) = caps.get(1) {
        return dec.as_str().parse::<u32>().ok().map(numeric);
    }
    if let Some(hex) = caps.get(2) {
        return u32::from_str_radix(hex.as_str(), 16).ok().map(numeric);
    }
    let name = caps.get(3)?.as_str();
    quick_xml::escape::resolve_html5_entity(name).map(str::to_string)
}

fn numeric(code: u32) -> String {
    match code {
        0 => '\u{FFFD}'.to_string(),
        _ => char::from_u32(code).unwrap_or('\u{FFFD}').to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_and_numeric() {
        assert_eq!(decode_entities("caf&eacute; &amp; bar"), "café & bar");
        assert_eq!(decode_entities("&#8212;&#x2014;&#X2014"), "———");
        assert_eq!(decode_entities("a&nbsp;b"), "a\u{a0}b");
    }

    #[test]
    fn test_unknown_and_bare_ampersand() {
        assert_eq!(decode_entities("R&D &notanentity; &"), "R&D &notanentity; &");
        assert!(matches!(decode_entities("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_invalid_code_points() {
        assert_eq!(decode_entities("&#0;&#xD800;"), "\u{FFFD}\u{FFFD}");
    }

    #[test]
    fn test_decode_entity_at() {
        let text = "x &lt;y";
        assert_eq!(decode_entity_at(text, 2), Some(("<".to_string(), 4)));
        assert_eq!(decode_entity_at(text, 0), None);
    }
}
