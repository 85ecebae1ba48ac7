pub mod markup;
pub mod entities;
pub mod normalizer;
pub mod segmenter;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("Malformed markup: {0}")]
    MalformedMarkup(String),

    #[error("Markup nested deeper than {0} elements")]
    NestingTooDeep(usize),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid text: {0}")]
    InvalidText(String),
}

pub type Result<T> = std::result::Result<T, ParserError>;

/// Text extracted from markup with a back-reference for every character.
#[derive(Debug, Clone, Default)]
pub struct TextMapping {
    pub cleaned_text: String,
    pub char_map: Vec<(usize, usize)>, // (start_byte, end_byte) in the source markup
}

impl TextMapping {
    /// Source byte range covered by the cleaned characters `start..end`.
    pub fn source_range(&self, start: usize, end: usize) -> Option<std::ops::Range<usize>> {
        if start >= end || end > self.char_map.len() {
            return None;
        }
        Some(self.char_map[start].0..self.char_map[end - 1].1)
    }
}

pub use self::markup::{MarkupLexer, Token, TokenKind, is_block_element, is_void_element};
pub use self::entities::decode_entities;
pub use self::normalizer::TextNormalizer;
pub use self::segmenter::Segmenter;
