pub mod assets;
pub mod rewrite;
pub mod tree;

use log::{debug, warn};
use regex::Regex;
use std::ops::Range;

use crate::config::subsystems::HighlighterConfig;
use crate::parser::markup::{collapse_whitespace, fold, folded_text, visible_text};
use crate::types::{HighlightedDocument, MatchCandidate, MatchTier};

use self::rewrite::{blind_substitute, flexible_pattern, literal_pattern, mark_open_tag, stable_hash, wrap_range};
use self::tree::MarkupTree;

/// Which strategy produced a highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightMethod {
    ParagraphElement,
    Structural,
    TextNode,
    Blind,
}

/// Wraps a matched span in a marker element without disturbing the
/// surrounding structure.
#[derive(Debug, Clone, Default)]
pub struct SpanHighlighter {
    config: HighlighterConfig,
}

impl SpanHighlighter {
    pub fn new(config: HighlighterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HighlighterConfig {
        &self.config
    }

    pub fn element_id(&self, candidate: &MatchCandidate) -> String {
        let prefix = match candidate.tier {
            MatchTier::Paragraph => &self.config.paragraph_id_prefix,
            _ => &self.config.id_prefix,
        };
        format!("{}-{}", prefix, stable_hash(&candidate.span, self.config.id_modulus))
    }

    /// The highlighted document and `true`, or the untouched document and `false`.
    pub fn highlight(&self, document: &str, candidate: &MatchCandidate) -> (String, bool) {
        match self.highlight_document(document, candidate) {
            Some(highlighted) => (highlighted.markup, true),
            None => (document.to_string(), false),
        }
    }

    pub fn highlight_document(&self, document: &str, candidate: &MatchCandidate) -> Option<HighlightedDocument> {
        let class = self.config.class_for(candidate.tier);
        let element_id = self.element_id(candidate);

        let (marked, method) = match self.mark(document, candidate, class, &element_id) {
            Some(result) => result,
            None => {
                debug!("No highlight placed for {} candidate", candidate.tier);
                return None;
            }
        };

        // Success means one more marker class occurrence than before
        if marked.matches(class).count() <= document.matches(class).count() {
            warn!("Highlight via {:?} did not add the {} class", method, class);
            return None;
        }
        debug!("Highlighted {} candidate via {:?} as #{}", candidate.tier, method, element_id);

        let markup = if self.config.inject_assets {
            assets::inject_assets(&marked, &self.config)
        } else {
            marked
        };

        Some(HighlightedDocument {
            markup,
            tier: candidate.tier,
            css_class: class.to_string(),
            element_id,
        })
    }

    fn mark(
        &self,
        document: &str,
        candidate: &MatchCandidate,
        class: &str,
        id: &str,
    ) -> Option<(String, HighlightMethod)> {
        let text = if candidate.span_is_markup() {
            visible_text(&candidate.span)
        } else {
            collapse_whitespace(&candidate.span)
        };
        if text.is_empty() {
            return None;
        }

        let tree = match MarkupTree::parse(document, self.config.max_depth) {
            Ok(tree) => tree,
            Err(e) => {
                warn!("Structural parse failed, falling back to substitution: {}", e);
                let needle = if candidate.span_is_markup() { candidate.span.as_str() } else { text.as_str() };
                return blind_substitute(document, needle, class, id).map(|out| (out, HighlightMethod::Blind));
            }
        };

        if candidate.span_is_markup() {
            if let Some(out) = mark_paragraph(&tree, &text, class, id) {
                return Some((out, HighlightMethod::ParagraphElement));
            }
        }

        mark_structural(&tree, &text, class, id)
            .map(|out| (out, HighlightMethod::Structural))
            .or_else(|| mark_text_node(&tree, &text, class, id).map(|out| (out, HighlightMethod::TextNode)))
            .or_else(|| blind_substitute(document, &text, class, id).map(|out| (out, HighlightMethod::Blind)))
    }
}

/// Adds the marker to the first `<p>` whose visible text holds `text`.
fn mark_paragraph(tree: &MarkupTree, text: &str, class: &str, id: &str) -> Option<String> {
    let src = tree.src();
    let needle = fold(text);

    let element = tree
        .elements_named("p")
        .find(|p| fold(&visible_text(&src[p.inner.clone()])).contains(&needle))?;

    let tag = mark_open_tag(&src[element.open.clone()], class, id);
    Some(format!("{}{}{}", &src[..element.open.start], tag, &src[element.open.end..]))
}

/// Flexible match inside the smallest element containing the span's text.
/// Every folded occurrence is tried, since whitespace folding also finds
/// the span inside longer words.
fn mark_structural(tree: &MarkupTree, text: &str, class: &str, id: &str) -> Option<String> {
    let src = tree.src();
    let mapping = folded_text(src);
    let needle = fold(text);
    if needle.is_empty() {
        return None;
    }
    let pattern = flexible_pattern(text).ok()?;
    let needle_chars = needle.chars().count();

    let mut from = 0;
    while let Some(relative) = mapping.cleaned_text[from..].find(&needle) {
        let byte = from + relative;
        let first = mapping.cleaned_text[..byte].chars().count();
        if let Some(located) = mapping.source_range(first, first + needle_chars) {
            let container = tree
                .smallest_containing(&located)
                .map_or(0..src.len(), |e| e.inner.clone());
            if let Some(out) = wrap_in_container(tree, &pattern, &container, class, id) {
                return Some(out);
            }
        }
        from = byte + mapping.cleaned_text[byte..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

fn wrap_in_container(
    tree: &MarkupTree,
    pattern: &Regex,
    container: &Range<usize>,
    class: &str,
    id: &str,
) -> Option<String> {
    let src = tree.src();
    let haystack = &src[..container.end];

    let mut at = container.start;
    while at < container.end {
        let found = pattern.find_at(haystack, at)?;
        if tree.in_text(found.start()) && tree.in_text(found.end() - 1) {
            let balanced = tree.balance(found.range(), container)?;
            return Some(wrap_range(src, balanced, class, id));
        }
        at = found.start() + src[found.start()..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

/// Wraps the span where it sits wholly inside one text node.
fn mark_text_node(tree: &MarkupTree, text: &str, class: &str, id: &str) -> Option<String> {
    let src = tree.src();
    let pattern = literal_pattern(text).ok()?;
    tree.text_tokens().find_map(|token| {
        pattern.find(&src[token.range.clone()]).map(|m| {
            let offset = token.range.start;
            wrap_range(src, offset + m.start()..offset + m.end(), class, id)
        })
    })
}
