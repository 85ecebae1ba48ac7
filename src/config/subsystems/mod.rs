pub mod segmenter;
pub mod matcher;
pub mod highlighter;
pub mod processor;

pub use segmenter::SegmenterConfig;
pub use matcher::{MatcherConfig, MatchStrategy};
pub use highlighter::HighlighterConfig;
pub use processor::ProcessorConfig;
