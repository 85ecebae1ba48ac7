//! The matching cascade, one stateless function per confidence tier.
//!
//! Every stage shares the [`Stage`] signature and either returns an
//! acceptable candidate or declines with `None`.

use lazy_static::lazy_static;
use log::trace;
use regex::{Regex, RegexBuilder};

use super::similarity::sequence_ratio;
use crate::config::subsystems::MatcherConfig;
use crate::parser::markup::{collapse_whitespace, visible_text};
use crate::parser::TextNormalizer;
use crate::types::{MatchCandidate, MatchTier, TargetPassage};

lazy_static! {
    static ref SENTENCE_END: Regex = Regex::new(r"[.!?]+").unwrap();
    static ref PARAGRAPH: Regex = Regex::new(r"(?is)<p(?:\s[^>]*)?>(.*?)</p>").unwrap();
    static ref BLOCK_BREAK: Regex = Regex::new(r"(?i)\n\n|\r\n\r\n|<br\s*/?>\s*<br\s*/?>").unwrap();
}

pub type Stage = fn(&TargetPassage, &DocumentText, &MatcherConfig) -> Option<MatchCandidate>;

/// Stages in priority order, most precise first.
pub const CASCADE: [(MatchTier, Stage); 6] = [
    (MatchTier::Exact, exact),
    (MatchTier::Sentence, sentence),
    (MatchTier::Fuzzy, fuzzy),
    (MatchTier::Context, context),
    (MatchTier::Keyword, keyword),
    (MatchTier::Paragraph, paragraph),
];

/// A document prepared once for every stage of the cascade.
#[derive(Debug, Clone)]
pub struct DocumentText<'a> {
    pub markup: &'a str,
    pub visible: String,
    /// Visible text split on runs of sentence punctuation, trimmed.
    pub sentences: Vec<String>,
}

impl<'a> DocumentText<'a> {
    pub fn new(markup: &'a str) -> Self {
        let visible = visible_text(markup);
        let sentences = SENTENCE_END
            .split(&visible)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self { markup, visible, sentences }
    }

    fn sentences_with_min_len(&self, min_len: usize) -> impl Iterator<Item = &str> {
        self.sentences
            .iter()
            .map(String::as_str)
            .filter(move |s| s.chars().count() >= min_len)
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Case-insensitive pattern for `words` separated by any whitespace.
fn words_pattern(words: &[&str], word_bounded: bool) -> Option<Regex> {
    if words.is_empty() {
        return None;
    }
    let body = words.iter().map(|w| regex::escape(w)).collect::<Vec<_>>().join(r"\s+");
    let pattern = if word_bounded { format!(r"\b{}\b", body) } else { body };
    RegexBuilder::new(&pattern).case_insensitive(true).build().ok()
}

/// Distinctive words of the target: long enough and not stopwords.
pub fn keywords(target: &str, config: &MatcherConfig) -> Vec<String> {
    target
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| char_len(w) > config.keyword_min_word_len && !config.is_stopword(w))
        .collect()
}

fn keyword_hits(keywords: &[String], text: &str) -> usize {
    let lower = text.to_lowercase();
    keywords.iter().filter(|k| lower.contains(k.as_str())).count()
}

/// Highest-scoring sentence by compact sequence ratio, if it reaches `threshold`.
fn best_ratio<'d>(
    needle: &str,
    candidates: impl Iterator<Item = &'d str>,
    threshold: f64,
) -> Option<(&'d str, f64)> {
    let normalizer = TextNormalizer::new();
    let needle = normalizer.normalize_compact(needle);
    if needle.is_empty() {
        return None;
    }

    let mut best: Option<(&str, f64)> = None;
    for candidate in candidates {
        let normalized = normalizer.normalize_compact(candidate);
        if normalized.is_empty() {
            continue;
        }
        let ratio = sequence_ratio(&needle, &normalized);
        if best.map_or(true, |(_, r)| ratio > r) {
            best = Some((candidate, ratio));
        }
    }
    trace!("Best ratio {:?} against threshold {}", best.map(|b| b.1), threshold);
    best.filter(|&(_, ratio)| accepts(ratio, threshold))
}

/// Inclusive threshold check shared by the ratio stages.
pub fn accepts(ratio: f64, threshold: f64) -> bool {
    ratio >= threshold
}

pub fn exact(target: &TargetPassage, doc: &DocumentText, _config: &MatcherConfig) -> Option<MatchCandidate> {
    let clean = collapse_whitespace(&target.primary);
    if clean.is_empty() || !doc.visible.to_lowercase().contains(&clean.to_lowercase()) {
        return None;
    }
    let words: Vec<&str> = clean.split(' ').collect();
    let found = words_pattern(&words, false)?.find(&doc.visible)?;
    Some(MatchCandidate::new(found.as_str(), MatchTier::Exact, Some(1.0)))
}

pub fn sentence(target: &TargetPassage, doc: &DocumentText, config: &MatcherConfig) -> Option<MatchCandidate> {
    let clean = collapse_whitespace(&target.primary);
    if char_len(&clean) <= config.sentence_min_target_len {
        return None;
    }
    let normalizer = TextNormalizer::new();

    clean
        .split('.')
        .map(str::trim)
        .filter(|piece| char_len(piece) > config.sentence_min_len)
        .filter(|piece| char_len(&normalizer.normalize_compact(piece)) > config.sentence_min_len)
        .find_map(|piece| {
            let words: Vec<&str> = piece.split_whitespace().collect();
            if words.len() < config.sentence_min_words {
                return None;
            }
            let found = words_pattern(&words, true)?.find(&doc.visible)?;
            Some(MatchCandidate::new(found.as_str(), MatchTier::Sentence, None))
        })
}

pub fn fuzzy(target: &TargetPassage, doc: &DocumentText, config: &MatcherConfig) -> Option<MatchCandidate> {
    let clean = collapse_whitespace(&target.primary);
    let candidates = doc.sentences_with_min_len(config.fuzzy_min_sentence_len);
    best_ratio(&clean, candidates, config.fuzzy_threshold)
        .map(|(span, ratio)| MatchCandidate::new(span, MatchTier::Fuzzy, Some(ratio)))
}

pub fn context(target: &TargetPassage, doc: &DocumentText, config: &MatcherConfig) -> Option<MatchCandidate> {
    let context = target.context.as_deref()?;
    if char_len(context) <= config.context_min_len {
        return None;
    }
    let candidates = doc.sentences_with_min_len(config.context_min_sentence_len);
    best_ratio(context, candidates, config.context_threshold)
        .map(|(span, ratio)| MatchCandidate::new(span, MatchTier::Context, Some(ratio)))
}

pub fn keyword(target: &TargetPassage, doc: &DocumentText, config: &MatcherConfig) -> Option<MatchCandidate> {
    let keywords = keywords(&target.primary, config);
    if keywords.is_empty() {
        return None;
    }
    let required = config.keyword_min_hits.min(keywords.len());

    doc.sentences_with_min_len(config.keyword_min_sentence_len)
        .find_map(|sentence| {
            let hits = keyword_hits(&keywords, sentence);
            (hits >= required).then(|| {
                MatchCandidate::new(sentence, MatchTier::Keyword, Some(hits as f64 / keywords.len() as f64))
            })
        })
}

/// Paragraph blocks as `(inner markup, visible text)` pairs.
pub fn paragraphs(markup: &str, min_len: usize) -> Vec<(&str, String)> {
    let tagged: Vec<&str> = PARAGRAPH
        .captures_iter(markup)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    let blocks = if tagged.is_empty() {
        BLOCK_BREAK.split(markup).map(str::trim).collect()
    } else {
        tagged
    };

    blocks
        .into_iter()
        .map(|block| (block, visible_text(block)))
        .filter(|(_, text)| char_len(text) >= min_len)
        .collect()
}

/// Relevance of one paragraph to the target.
pub fn paragraph_score(
    keywords: &[String],
    target: &str,
    paragraph_text: &str,
    config: &MatcherConfig,
) -> f64 {
    let normalizer = TextNormalizer::new();
    let mut score = keyword_hits(keywords, paragraph_text) as f64 * config.paragraph_keyword_weight;

    let target = normalizer.normalize_compact(target);
    let paragraph = normalizer.normalize_compact(paragraph_text);
    if !target.is_empty() && !paragraph.is_empty() {
        score += sequence_ratio(&target, &paragraph) * config.paragraph_similarity_weight;
    }

    let length_bonus = char_len(paragraph_text) as f64 / config.paragraph_length_divisor;
    score + length_bonus.min(config.paragraph_length_cap)
}

pub fn paragraph(target: &TargetPassage, doc: &DocumentText, config: &MatcherConfig) -> Option<MatchCandidate> {
    let keywords = keywords(&target.primary, config);

    let mut best: Option<(&str, f64)> = None;
    for (inner, text) in paragraphs(doc.markup, config.paragraph_min_len) {
        let score = paragraph_score(&keywords, &target.primary, &text, config);
        if best.map_or(score > 0.0, |(_, s)| score > s) {
            best = Some((inner, score));
        }
    }

    best.filter(|&(_, score)| score > config.paragraph_min_score)
        .map(|(inner, score)| MatchCandidate::new(inner, MatchTier::Paragraph, Some(score)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "<html><body>\
        <p>The mission launched in 1969 and returned safely. It carried three astronauts.</p>\
        <p>abcde fghij klmno vwxyz. Other filler text goes here for padding purposes only.</p>\
        </body></html>";

    fn run(stage: Stage, target: &TargetPassage) -> Option<MatchCandidate> {
        stage(target, &DocumentText::new(DOC), &MatcherConfig::default())
    }

    #[test]
    fn test_document_text() {
        let doc = DocumentText::new("<p>One two three! Four?? <b>Five</b>.</p>");
        assert_eq!(doc.visible, "One two three! Four?? Five .");
        assert_eq!(doc.sentences, vec!["One two three", "Four", "Five"]);
    }

    #[test]
    fn test_exact_recovers_original_case_and_spacing() {
        let doc = DocumentText::new("<p>The   Mission\n launched</p>");
        let target = TargetPassage::new("the mission LAUNCHED");
        let found = exact(&target, &doc, &MatcherConfig::default()).unwrap();
        assert_eq!(found.span, "The Mission launched");
        assert_eq!(found.tier, MatchTier::Exact);
    }

    #[test]
    fn test_sentence_stage() {
        let target = TargetPassage::new("Nothing like this appears. It carried   three astronauts");
        let found = run(sentence, &target).unwrap();
        assert_eq!(found.span, "It carried three astronauts");

        // Short targets skip this stage
        assert!(run(sentence, &TargetPassage::new("It carried three astronauts")).is_none());
    }

    #[test]
    fn test_fuzzy_threshold_boundary() {
        // 15 of 20 compact characters in common: ratio exactly 0.75
        let accepted = run(fuzzy, &TargetPassage::new("abcde fghij klmno pqrst")).unwrap();
        assert_eq!(accepted.span, "abcde fghij klmno vwxyz");
        assert_eq!(accepted.score, Some(0.75));

        // 14 of 20: ratio 0.7
        assert!(run(fuzzy, &TargetPassage::new("abcde fghij klmnp qrstu")).is_none());

        assert!(accepts(0.75, 0.75));
        assert!(!accepts(0.7499, 0.75));
        assert!(accepts(0.6, 0.6));
        assert!(!accepts(0.5999, 0.6));
    }

    #[test]
    fn test_context_stage() {
        let passage = "The mission launched in 1969 and came back home safely to the ocean";
        let target = TargetPassage::with_context("zzz", passage);
        let found = run(context, &target).unwrap();
        assert_eq!(found.tier, MatchTier::Context);
        assert_eq!(found.span, "The mission launched in 1969 and returned safely");

        // Context of 50 characters or fewer is ignored
        let short = TargetPassage::with_context("zzz", "The mission launched in 1969");
        assert!(run(context, &short).is_none());
    }

    #[test]
    fn test_context_stage_boundaries() {
        let sentence = "The quick brown fox jumps over the lazy dog";
        let doc = DocumentText::new("<p>The quick brown fox jumps over the lazy dog</p>");
        let config = MatcherConfig::default();
        let digits = "1234567890".repeat(5);
        let with_digits = |n: usize| TargetPassage::with_context("zzz", format!("{} {}", sentence, &digits[..n]));

        // 35 shared of 35 + 81 compact characters: ratio 70/116
        let found = context(&with_digits(46), &doc, &config).unwrap();
        assert_eq!(found.span, sentence);
        assert!((found.score.unwrap() - 70.0 / 116.0).abs() < 1e-9);

        // One more unrelated character: ratio 70/117, below 0.6
        assert!(context(&with_digits(47), &doc, &config).is_none());

        // Context length must exceed 50 characters
        assert_eq!(with_digits(6).context.as_deref().map(char_len), Some(50));
        assert!(context(&with_digits(6), &doc, &config).is_none());
        assert!(context(&with_digits(7), &doc, &config).is_some());
    }

    #[test]
    fn test_keywords_and_stage() {
        let config = MatcherConfig::default();
        assert_eq!(
            keywords("The mission, launched with would nineteen", &config),
            vec!["mission", "launched", "nineteen"]
        );
        let found = run(keyword, &TargetPassage::new("mission launched unrelated")).unwrap();
        assert_eq!(found.tier, MatchTier::Keyword);
        assert_eq!(found.span, "The mission launched in 1969 and returned safely");

        // A single distinctive keyword only needs one hit
        let found = run(keyword, &TargetPassage::new("the astronauts")).unwrap();
        assert_eq!(found.span, "It carried three astronauts");
    }

    #[test]
    fn test_paragraph_stage_returns_inner_markup() {
        let html = "<pre>not a paragraph at all but long enough to count as one block</pre>\
            <p class=\"x\">Short one.</p>\
            <p>The <a href=\"/wiki/Moon\">Moon</a> landing happened while the crew orbited above the surface.</p>";
        let doc = DocumentText::new(html);
        let found = paragraph(&TargetPassage::new("lunar landing orbited"), &doc, &MatcherConfig::default()).unwrap();
        assert_eq!(found.tier, MatchTier::Paragraph);
        assert_eq!(
            found.span,
            "The <a href=\"/wiki/Moon\">Moon</a> landing happened while the crew orbited above the surface."
        );
    }

    #[test]
    fn test_paragraph_fallback_without_p_tags() {
        let html = "First block of text that is certainly longer than fifty characters.\n\n\
            Second block mentioning the telescope and its mirror at great length here.";
        let blocks = paragraphs(html, 50);
        assert_eq!(blocks.len(), 2);
        let found = paragraph(
            &TargetPassage::new("telescope mirror"),
            &DocumentText::new(html),
            &MatcherConfig::default(),
        )
        .unwrap();
        assert!(found.span.starts_with("Second block"));
    }

    #[test]
    fn test_paragraph_score_below_threshold() {
        let config = MatcherConfig::default();
        let text = "Completely unrelated paragraph about gardening and the weather today.";
        let score = paragraph_score(&[], "qqqq zzzz", text, &config);
        assert!(score <= 1.0);
    }
}
