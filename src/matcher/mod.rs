pub mod similarity;
pub mod stages;
pub mod segments;

use log::{debug, trace};

use crate::config::subsystems::{MatcherConfig, MatchStrategy, SegmenterConfig};
use crate::parser::Segmenter;
use crate::types::{MatchCandidate, Segment, TargetPassage};

pub use self::stages::{DocumentText, Stage, CASCADE};

/// Locates the passage in a document that best matches a target.
#[derive(Debug, Clone, Default)]
pub struct CandidateMatcher {
    config: MatcherConfig,
    segmenter: Segmenter,
}

impl CandidateMatcher {
    pub fn new(config: MatcherConfig, segmenter_config: SegmenterConfig) -> Self {
        Self {
            config,
            segmenter: Segmenter::new(segmenter_config),
        }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Runs the configured strategy. `None` means no stage found an acceptable span.
    pub fn find_best_match(&self, document: &str, target: &TargetPassage) -> Option<MatchCandidate> {
        if target.is_degenerate() || document.trim().is_empty() {
            debug!("Skipping match for degenerate target or empty document");
            return None;
        }
        match self.config.strategy {
            MatchStrategy::Cascade => self.run_cascade(document, target),
            MatchStrategy::Segment => {
                let segments = self.segmenter.sentences(document);
                self.find_in_segments(&segments, target)
            }
        }
    }

    /// Segment strategy over an already segmented document.
    pub fn find_in_segments(&self, segments: &[Segment<'_>], target: &TargetPassage) -> Option<MatchCandidate> {
        if target.is_degenerate() {
            return None;
        }
        segments::best_segment(target, segments, &self.config)
    }

    fn run_cascade(&self, document: &str, target: &TargetPassage) -> Option<MatchCandidate> {
        let doc = DocumentText::new(document);
        trace!(
            "Cascade over {} visible chars, {} sentences",
            doc.visible.len(),
            doc.sentences.len()
        );

        for (tier, stage) in CASCADE.iter() {
            if let Some(candidate) = stage(target, &doc, &self.config) {
                debug!("Matched at tier {} (score {:?})", tier, candidate.score);
                return Some(candidate);
            }
            trace!("Tier {} declined", tier);
        }

        debug!("No acceptable match for {:?}", truncate(&target.primary, 60));
        None
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
