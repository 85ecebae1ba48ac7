//! wikifix locates passages of text inside cached encyclopedia pages and
//! marks them up so a reviewer sees the passage highlighted in place.
//! Matching runs a cascade of increasingly tolerant strategies; highlighting
//! preserves the page's structure wherever the markup allows.

// Module declarations
pub mod error;
pub mod types;
pub mod config;
pub mod parser;
pub mod matcher;
pub mod highlighter;
pub mod storage;
pub mod pipeline;
pub mod utils;

// Re-exports
pub use error::{Error, Result};
pub use types::{HighlightedDocument, MatchCandidate, MatchTier, Segment, SegmentKind, TargetPassage};
pub use parser::{Segmenter, TextNormalizer};
pub use matcher::CandidateMatcher;
pub use highlighter::SpanHighlighter;
pub use storage::{CachedSource, DocumentSource, FsPageStore, MemoryPageStore};
pub use pipeline::{run_batch, BatchStats, ItemOutcome, Pipeline, SideOutcome, WorkItem};

// Re-export the config from config module
pub use config::WikifixConfig;
