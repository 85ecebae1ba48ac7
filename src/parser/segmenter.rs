// Sentence-like chunking of markup that keeps every byte

use log::trace;

use super::markup::{is_block_element, MarkupLexer, Token, TokenKind};
use crate::config::subsystems::SegmenterConfig;
use crate::types::{Segment, SegmentKind};

/// Splits a document at block-level tags, then at sentence punctuation.
///
/// Sentence detection is approximate: a boundary needs `.`, `!` or `?` outside
/// any open inline element, optional whitespace, then end of input, an
/// uppercase letter or a tag.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    config: SegmenterConfig,
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    /// Every segment of `document`; concatenated they reproduce it exactly.
    pub fn split<'a>(&self, document: &'a str) -> Vec<Segment<'a>> {
        let mut segments = Vec::new();
        let mut run: Vec<Token> = Vec::new();

        for token in MarkupLexer::new(document) {
            let is_boundary = match &token.kind {
                TokenKind::OpenTag { name, .. } | TokenKind::CloseTag { name } => is_block_element(name),
                _ => false,
            };
            if is_boundary {
                split_sentences(document, &run, &mut segments);
                run.clear();
                segments.push(Segment {
                    kind: SegmentKind::Boundary,
                    text: &document[token.range.clone()],
                    range: token.range,
                });
            } else {
                run.push(token);
            }
        }
        split_sentences(document, &run, &mut segments);

        trace!("Split {} bytes into {} segments", document.len(), segments.len());
        segments
    }

    /// Content segments long enough to be offered as match candidates.
    pub fn sentences<'a>(&self, document: &'a str) -> Vec<Segment<'a>> {
        self.split(document)
            .into_iter()
            .filter(|s| !s.is_boundary() && s.trimmed_len() >= self.config.min_segment_len)
            .collect()
    }
}

fn split_sentences<'a>(document: &'a str, run: &[Token], out: &mut Vec<Segment<'a>>) {
    let (start, end) = match (run.first(), run.last()) {
        (Some(first), Some(last)) => (first.range.start, last.range.end),
        _ => return,
    };

    let mut cuts = vec![start];
    let mut open: Vec<&str> = Vec::new();

    for (idx, token) in run.iter().enumerate() {
        match &token.kind {
            TokenKind::OpenTag { .. } => {
                if let Some(name) = token.opens_element() {
                    open.push(name);
                }
            }
            TokenKind::CloseTag { name } => {
                if let Some(pos) = open.iter().rposition(|n| n == name) {
                    open.truncate(pos);
                }
            }
            TokenKind::Text if open.is_empty() => {
                let next_is_tag = run.get(idx + 1).map(Token::is_tag);
                sentence_cuts(document, token, next_is_tag, &mut cuts);
            }
            _ => {}
        }
    }
    cuts.push(end);

    for pair in cuts.windows(2) {
        if pair[0] < pair[1] {
            out.push(Segment {
                kind: SegmentKind::Content,
                range: pair[0]..pair[1],
                text: &document[pair[0]..pair[1]],
            });
        }
    }
}

/// Records a cut after each sentence terminator in one text token.
///
/// `next_is_tag` is `None` when the token ends the run.
fn sentence_cuts(document: &str, token: &Token, next_is_tag: Option<bool>, cuts: &mut Vec<usize>) {
    let text = &document[token.range.clone()];
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        while let Some(&(_, ws)) = chars.peek() {
            if matches!(ws, ' ' | '\t' | '\n' | '\r') {
                chars.next();
            } else {
                break;
            }
        }
        let accept = match chars.peek() {
            Some(&(_, next)) => next.is_uppercase(),
            None => next_is_tag.unwrap_or(true),
        };
        if accept {
            let at = token.range.start + chars.peek().map_or(text.len(), |&(i, _)| i);
            if cuts.last().map_or(true, |&last| last < at) {
                cuts.push(at);
            }
        }
    }
}
