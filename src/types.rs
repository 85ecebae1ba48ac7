use serde::{Serialize, Deserialize};
use std::fmt;
use std::ops::Range;

/// Whether a segment is a bare block-level tag or a run of content markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentKind {
    Boundary,
    Content,
}

/// One chunk of a document's markup, borrowed from the document itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub kind: SegmentKind,
    pub range: Range<usize>,
    pub text: &'a str,
}

impl<'a> Segment<'a> {
    pub fn is_boundary(&self) -> bool {
        self.kind == SegmentKind::Boundary
    }

    /// Length of the trimmed markup in characters.
    pub fn trimmed_len(&self) -> usize {
        self.text.trim().chars().count()
    }
}

/// The passage to locate, plus an optional looser context passage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetPassage {
    pub primary: String,
    pub context: Option<String>,
}

impl TargetPassage {
    pub fn new<S: Into<String>>(primary: S) -> Self {
        Self {
            primary: primary.into(),
            context: None,
        }
    }

    pub fn with_context<S: Into<String>, C: Into<String>>(primary: S, context: C) -> Self {
        let context = context.into();
        Self {
            primary: primary.into(),
            context: if context.trim().is_empty() { None } else { Some(context) },
        }
    }

    /// A whitespace-only primary string never reaches the matcher.
    pub fn is_degenerate(&self) -> bool {
        self.primary.trim().is_empty()
    }
}

/// Confidence tiers, ordered from most to least precise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    Exact,
    Sentence,
    Fuzzy,
    Context,
    Keyword,
    Paragraph,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::Sentence => "sentence",
            MatchTier::Fuzzy => "fuzzy",
            MatchTier::Context => "context",
            MatchTier::Keyword => "keyword",
            MatchTier::Paragraph => "paragraph",
        }
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one matching attempt.
///
/// `span` is plain visible text for every tier except [`MatchTier::Paragraph`],
/// where it holds the paragraph's original inner markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub span: String,
    pub tier: MatchTier,
    pub score: Option<f64>,
}

impl MatchCandidate {
    pub fn new<S: Into<String>>(span: S, tier: MatchTier, score: Option<f64>) -> Self {
        Self {
            span: span.into(),
            tier,
            score,
        }
    }

    pub fn span_is_markup(&self) -> bool {
        self.tier == MatchTier::Paragraph
    }
}

/// A document with one highlighted span and the injected presentation assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightedDocument {
    pub markup: String,
    pub tier: MatchTier,
    pub css_class: String,
    pub element_id: String,
}
