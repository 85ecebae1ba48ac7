// String-level edits on serialized markup

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use sha2::{Digest, Sha256};
use std::ops::Range;

use crate::parser::{ParserError, Result};

lazy_static! {
    static ref CLASS_ATTR: Regex =
        Regex::new(r#"(?i)(\sclass\s*=\s*)(?:"([^"]*)"|'([^']*)'|([^\s"'>/]+))"#).unwrap();
    static ref ID_ATTR: Regex =
        Regex::new(r#"(?i)\sid\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>/]+)"#).unwrap();
}

const BETWEEN_CHARS: &str = r"(?:<[^>]*>)*";
const FLEXIBLE_SPACE: &str = r"(?:\s|&nbsp;|&#160;|&#xa0;|<[^>]*>)+";

/// Stable numeric suffix for element ids.
pub fn stable_hash(text: &str, modulus: u64) -> u64 {
    let digest = Sha256::digest(text.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix) % modulus.max(1)
}

/// `text` wrapped in a marker span, keeping the original markup inside.
pub fn wrap_range(document: &str, range: Range<usize>, class: &str, id: &str) -> String {
    let mut out = String::with_capacity(document.len() + class.len() + id.len() + 32);
    out.push_str(&document[..range.start]);
    out.push_str(&format!("<span class=\"{}\" id=\"{}\">", class, id));
    out.push_str(&document[range.clone()]);
    out.push_str("</span>");
    out.push_str(&document[range.end..]);
    out
}

/// Pattern matching `text` even when tags, non-breaking spaces or
/// character references sit between its characters.
pub fn flexible_pattern(text: &str) -> Result<Regex> {
    let mut pieces: Vec<String> = Vec::new();
    let mut pending_space = false;

    for c in text.chars() {
        if c.is_whitespace() {
            pending_space = !pieces.is_empty();
            continue;
        }
        if pending_space {
            pieces.push(FLEXIBLE_SPACE.to_string());
            pending_space = false;
        }
        let escaped = regex::escape(c.encode_utf8(&mut [0u8; 4]));
        if c.is_ascii_alphanumeric() {
            pieces.push(escaped);
        } else {
            pieces.push(format!("(?:{}|&[#\\w]+;)", escaped));
        }
    }

    if pieces.is_empty() {
        return Err(ParserError::InvalidText("nothing to highlight".to_string()));
    }

    let pattern = pieces.join(BETWEEN_CHARS);
    Ok(RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .size_limit(64 * (1 << 20))
        .build()?)
}

/// Escaped literal with whitespace runs relaxed to `\s+`.
pub fn literal_pattern(text: &str) -> Result<Regex> {
    let words: Vec<String> = text.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        return Err(ParserError::InvalidText("nothing to highlight".to_string()));
    }
    Ok(RegexBuilder::new(&words.join(r"\s+"))
        .case_insensitive(true)
        .size_limit(64 * (1 << 20))
        .build()?)
}

/// Whether byte `pos` sits between a `<` and its `>`.
pub fn inside_tag(document: &str, pos: usize) -> bool {
    let before = &document[..pos];
    match (before.rfind('<'), before.rfind('>')) {
        (Some(lt), Some(gt)) => lt > gt,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Wraps the first match of `text` that is not inside a tag.
pub fn blind_substitute(document: &str, text: &str, class: &str, id: &str) -> Option<String> {
    let pattern = literal_pattern(text).ok()?;
    let found = pattern
        .find_iter(document)
        .find(|m| !inside_tag(document, m.start()))
        .map(|m| wrap_range(document, m.range(), class, id));
    found
}

/// Open tag with `class` appended to its class list and `id` set.
pub fn mark_open_tag(tag: &str, class: &str, id: &str) -> String {
    let with_class = match CLASS_ATTR.captures(tag) {
        Some(caps) => {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            let prefix = caps.get(1).map_or("", |m| m.as_str());
            let existing = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str())
                .trim();
            let classes = if existing.is_empty() {
                class.to_string()
            } else if existing.split_whitespace().any(|c| c == class) {
                existing.to_string()
            } else {
                format!("{} {}", existing, class)
            };
            format!("{}{}\"{}\"{}", &tag[..whole.start], prefix, classes, &tag[whole.end..])
        }
        None => insert_attribute(tag, &format!(" class=\"{}\"", class)),
    };

    let without_id = ID_ATTR.replace(&with_class, "").into_owned();
    insert_attribute(&without_id, &format!(" id=\"{}\"", id))
}

fn insert_attribute(tag: &str, attribute: &str) -> String {
    let body = tag.trim_end_matches('>');
    let (body, tail) = match body.strip_suffix('/') {
        Some(stripped) => (stripped.trim_end(), &tag[stripped.trim_end().len()..]),
        None => (body, &tag[body.len()..]),
    };
    format!("{}{}{}", body, attribute, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_hash_is_deterministic() {
        let a = stable_hash("launched in 1969", 10_000);
        assert_eq!(a, stable_hash("launched in 1969", 10_000));
        assert!(a < 10_000);
        assert_ne!(a, stable_hash("launched in 1970", 10_000));
    }

    #[test]
    fn test_flexible_pattern_crosses_tags_and_entities() {
        let re = flexible_pattern("Apollo 11 - Moon").unwrap();
        let html = "<a href=\"/wiki/Apollo_11\">Apollo</a>&nbsp;11 &#8211; <i>Moon</i>";
        let m = re.find(html).unwrap();
        assert_eq!(m.as_str(), "Apollo</a>&nbsp;11 &#8211; <i>Moon");
        assert!(flexible_pattern("   ").is_err());
    }

    #[test]
    fn test_literal_pattern_and_inside_tag() {
        let re = literal_pattern("launched  in").unwrap();
        assert!(re.is_match("LAUNCHED\nin"));
        let doc = "<a title=\"launched\">launched</a>";
        assert!(inside_tag(doc, doc.find("launched").unwrap()));
        assert!(!inside_tag(doc, doc.rfind("launched").unwrap()));
    }

    #[test]
    fn test_blind_substitute_skips_attributes() {
        let doc = "<a title=\"Launched\">it launched today</a>";
        let out = blind_substitute(doc, "launched", "mark", "m-1").unwrap();
        assert_eq!(
            out,
            "<a title=\"Launched\">it <span class=\"mark\" id=\"m-1\">launched</span> today</a>"
        );
        assert!(blind_substitute(doc, "absent", "mark", "m-1").is_none());
    }

    #[test]
    fn test_mark_open_tag() {
        assert_eq!(mark_open_tag("<p>", "hl", "p-1"), "<p class=\"hl\" id=\"p-1\">");
        assert_eq!(
            mark_open_tag("<p class=\"lead intro\" id=\"old\">", "hl", "p-1"),
            "<p class=\"lead intro hl\" id=\"p-1\">"
        );
        assert_eq!(
            mark_open_tag("<P CLASS=lead data-x='1'>", "hl", "p-2"),
            "<P CLASS=\"lead hl\" data-x='1' id=\"p-2\">"
        );
        assert_eq!(mark_open_tag("<p/>", "hl", "p-3"), "<p class=\"hl\" id=\"p-3\"/>");
    }
}
