pub mod batch;
pub mod work_item;

use log::{debug, trace, warn};

use crate::config::subsystems::ProcessorConfig;
use crate::config::WikifixConfig;
use crate::highlighter::SpanHighlighter;
use crate::matcher::CandidateMatcher;
use crate::storage::DocumentSource;
use crate::types::{HighlightedDocument, MatchTier};
use crate::utils::links::rewrite_links;

pub use self::batch::{run_batch, BatchStats, ItemResult};
pub use self::work_item::{HighlightRecord, ItemRecord, LlmReport, SideInput, WorkItem};

/// Terminal state of one side of a work item.
#[derive(Debug, Clone, PartialEq)]
pub enum SideOutcome {
    Highlighted(HighlightedDocument),
    /// A candidate was found but could not be marked up.
    HighlightFailed { tier: MatchTier },
    NoMatch,
    DegenerateTarget,
    InputUnavailable,
}

impl SideOutcome {
    pub fn is_highlighted(&self) -> bool {
        matches!(self, SideOutcome::Highlighted(_))
    }

    pub fn tier(&self) -> Option<MatchTier> {
        match self {
            SideOutcome::Highlighted(doc) => Some(doc.tier),
            SideOutcome::HighlightFailed { tier } => Some(*tier),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SideOutcome::Highlighted(_) => "highlighted",
            SideOutcome::HighlightFailed { .. } => "highlight_failed",
            SideOutcome::NoMatch => "no_match",
            SideOutcome::DegenerateTarget => "degenerate_target",
            SideOutcome::InputUnavailable => "input_unavailable",
        }
    }

    pub fn into_markup(self) -> Option<String> {
        match self {
            SideOutcome::Highlighted(doc) => Some(doc.markup),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemOutcome {
    pub claim: SideOutcome,
    pub evidence: SideOutcome,
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        self.claim.is_highlighted() || self.evidence.is_highlighted()
    }

    /// Human-readable reason for a failed item, one clause per side.
    pub fn failure_reason(&self) -> String {
        format!("claim: {}, evidence: {}", self.claim.label(), self.evidence.label())
    }
}

/// Runs matcher and highlighter over both sides of work items.
pub struct Pipeline<S> {
    source: S,
    matcher: CandidateMatcher,
    highlighter: SpanHighlighter,
    processor: ProcessorConfig,
}

impl<S: DocumentSource> Pipeline<S> {
    pub fn new(source: S, config: &WikifixConfig) -> Self {
        Self {
            source,
            matcher: CandidateMatcher::new(config.matcher.clone(), config.segmenter.clone()),
            highlighter: SpanHighlighter::new(config.highlighter.clone()),
            processor: config.processor.clone(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn processor_config(&self) -> &ProcessorConfig {
        &self.processor
    }

    pub fn process_item(&self, item: &WorkItem) -> ItemOutcome {
        trace!("Processing item {}", item.id);
        let outcome = ItemOutcome {
            claim: self.highlight_side(&item.claim),
            evidence: self.highlight_side(&item.evidence),
        };
        debug!(
            "Item {}: claim {}, evidence {}",
            item.id,
            outcome.claim.label(),
            outcome.evidence.label()
        );
        outcome
    }

    /// Fetch, rewrite, match and highlight one side. Never fails; every
    /// problem ends in a non-highlighted outcome.
    pub fn highlight_side(&self, side: &SideInput) -> SideOutcome {
        if side.target.is_degenerate() {
            return SideOutcome::DegenerateTarget;
        }

        let page_key = match side.page_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key,
            _ => return SideOutcome::InputUnavailable,
        };

        let document = match self.source.fetch(page_key) {
            Ok(Some(document)) => document,
            Ok(None) => {
                debug!("Page {} not available from {}", page_key, self.source.describe());
                return SideOutcome::InputUnavailable;
            }
            Err(e) => {
                warn!("Failed to load page {}: {}", page_key, e);
                return SideOutcome::InputUnavailable;
            }
        };

        let rewritten;
        let markup: &str = if self.processor.rewrite_links {
            rewritten = rewrite_links(&document, page_key, &self.processor);
            &rewritten
        } else {
            &document
        };

        let candidate = match self.matcher.find_best_match(markup, &side.target) {
            Some(candidate) => candidate,
            None => return SideOutcome::NoMatch,
        };

        match self.highlighter.highlight_document(markup, &candidate) {
            Some(highlighted) => SideOutcome::Highlighted(highlighted),
            None => SideOutcome::HighlightFailed { tier: candidate.tier },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryPageStore;
    use crate::types::TargetPassage;

    fn pipeline() -> Pipeline<MemoryPageStore> {
        let store: MemoryPageStore = [(
            "Moon",
            r#"<html><head></head><body><p>The Moon orbits the Earth. See <a href="/wiki/Tide">tides</a>.</p></body></html>"#,
        )]
        .into_iter()
        .collect();
        Pipeline::new(store, &WikifixConfig::default())
    }

    #[test]
    fn test_highlight_side_rewrites_links() {
        let outcome = pipeline().highlight_side(&SideInput::new("Moon", TargetPassage::new("The Moon orbits the Earth.")));
        match outcome {
            SideOutcome::Highlighted(doc) => {
                assert_eq!(doc.tier, MatchTier::Exact);
                assert!(doc.markup.contains(r#"href="/api/wiki/Tide""#));
            }
            other => panic!("expected a highlight, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_failure_is_success() {
        let item = WorkItem {
            id: "1".to_string(),
            claim: SideInput::new("Moon", TargetPassage::new("The Moon orbits the Earth.")),
            evidence: SideInput::new("Mars", TargetPassage::new("Mars is red.")),
            record: None,
        };
        let outcome = pipeline().process_item(&item);
        assert!(outcome.claim.is_highlighted());
        assert_eq!(outcome.evidence, SideOutcome::InputUnavailable);
        assert!(outcome.is_success());
    }

    #[test]
    fn test_failed_sides() {
        let pipeline = pipeline();
        assert_eq!(
            pipeline.highlight_side(&SideInput::new("Moon", TargetPassage::new("   "))),
            SideOutcome::DegenerateTarget
        );
        assert_eq!(
            pipeline.highlight_side(&SideInput { page_key: None, target: TargetPassage::new("Moon") }),
            SideOutcome::InputUnavailable
        );
        assert_eq!(
            pipeline.highlight_side(&SideInput::new("Moon", TargetPassage::new("zebra xylophone quantum"))),
            SideOutcome::NoMatch
        );

        let outcome = ItemOutcome {
            claim: SideOutcome::NoMatch,
            evidence: SideOutcome::HighlightFailed { tier: MatchTier::Keyword },
        };
        assert!(!outcome.is_success());
        assert_eq!(outcome.failure_reason(), "claim: no_match, evidence: highlight_failed");
        assert_eq!(outcome.evidence.tier(), Some(MatchTier::Keyword));
    }
}
