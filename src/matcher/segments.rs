// Segment strategy: score each sentence chunk with a token-order-insensitive ratio

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use super::similarity::token_sort_ratio;
use crate::config::subsystems::MatcherConfig;
use crate::parser::markup::visible_text;
use crate::parser::TextNormalizer;
use crate::types::{MatchCandidate, MatchTier, Segment, TargetPassage};

lazy_static! {
    static ref FIRST_SENTENCE: Regex = Regex::new(r"(?s)^(.+?[.!?])").unwrap();
    static ref ANCHOR: Regex = Regex::new(r"(?is)<a\s[^>]*>(.*?)</a>").unwrap();
}

/// The leading sentence of `text`, or all of it when no terminator appears.
pub fn first_sentence(text: &str) -> &str {
    let text = text.trim();
    FIRST_SENTENCE
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or(text, |m| m.as_str().trim())
}

pub fn strip_anchors(markup: &str) -> std::borrow::Cow<'_, str> {
    ANCHOR.replace_all(markup, "$1")
}

/// Best content segment scoring at least `segment_score_cutoff` on a 0–100 scale.
pub fn best_segment(
    target: &TargetPassage,
    segments: &[Segment<'_>],
    config: &MatcherConfig,
) -> Option<MatchCandidate> {
    let needle = if config.first_sentence_only {
        first_sentence(&target.primary)
    } else {
        target.primary.trim()
    };
    let normalizer = TextNormalizer::new();
    let needle = normalizer.normalize(needle);
    if needle.is_empty() {
        return None;
    }

    let mut best: Option<(String, f64)> = None;
    for segment in segments.iter().filter(|s| !s.is_boundary()) {
        let text = visible_text(&strip_anchors(segment.text));
        let score = token_sort_ratio(&needle, &normalizer.normalize(&text));
        if best.as_ref().map_or(true, |(_, s)| score > *s) {
            best = Some((text, score));
        }
    }

    debug!("Best segment score {:?}", best.as_ref().map(|b| b.1));
    best.filter(|(text, score)| *score >= config.segment_score_cutoff && !text.is_empty())
        .map(|(text, score)| MatchCandidate::new(text, MatchTier::Fuzzy, Some(score)))
}
