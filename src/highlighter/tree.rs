// Element structure recovered from the token stream, kept as byte ranges

use std::ops::Range;

use crate::parser::markup::{is_raw_text_element, MarkupLexer, Token, TokenKind};
use crate::parser::{ParserError, Result};

#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    pub open: Range<usize>,
    /// Explicit close tag, `None` when the element was closed implicitly.
    pub close: Option<Range<usize>>,
    pub inner: Range<usize>,
    pub depth: usize,
}

impl Element {
    pub fn outer(&self) -> Range<usize> {
        self.open.start..self.close.as_ref().map_or(self.inner.end, |c| c.end)
    }
}

/// Elements and tokens of one document. Building it is the structural
/// parse that can fail on pathological input.
#[derive(Debug)]
pub struct MarkupTree<'a> {
    src: &'a str,
    pub elements: Vec<Element>,
    pub tokens: Vec<Token>,
}

impl<'a> MarkupTree<'a> {
    pub fn parse(src: &'a str, max_depth: usize) -> Result<Self> {
        let tokens: Vec<Token> = MarkupLexer::new(src).collect();
        let mut elements: Vec<Element> = Vec::new();
        let mut open: Vec<usize> = Vec::new();

        for token in &tokens {
            match &token.kind {
                TokenKind::Unterminated => {
                    return Err(ParserError::MalformedMarkup(format!(
                        "unterminated construct at byte {}",
                        token.range.start
                    )));
                }
                TokenKind::OpenTag { .. } => {
                    if let Some(name) = token.opens_element() {
                        if open.len() >= max_depth {
                            return Err(ParserError::NestingTooDeep(max_depth));
                        }
                        open.push(elements.len());
                        elements.push(Element {
                            name: name.to_string(),
                            open: token.range.clone(),
                            close: None,
                            inner: token.range.end..src.len(),
                            depth: open.len() - 1,
                        });
                    }
                }
                TokenKind::CloseTag { name } => {
                    // Stray close tags are ignored; unclosed children end here
                    if let Some(pos) = open.iter().rposition(|&idx| elements[idx].name == *name) {
                        for &idx in &open[pos + 1..] {
                            elements[idx].inner.end = token.range.start;
                        }
                        let idx = open[pos];
                        elements[idx].inner.end = token.range.start;
                        elements[idx].close = Some(token.range.clone());
                        open.truncate(pos);
                    }
                }
                _ => {}
            }
        }

        Ok(Self { src, elements, tokens })
    }

    pub fn src(&self) -> &'a str {
        self.src
    }

    /// Deepest element whose content holds `range`, ignoring raw-text elements.
    pub fn smallest_containing(&self, range: &Range<usize>) -> Option<&Element> {
        self.elements
            .iter()
            .filter(|e| !is_raw_text_element(&e.name))
            .filter(|e| e.inner.start <= range.start && range.end <= e.inner.end)
            .min_by_key(|e| (e.inner.len(), usize::MAX - e.depth))
    }

    pub fn elements_named<'t>(&'t self, name: &'t str) -> impl Iterator<Item = &'t Element> + 't {
        self.elements.iter().filter(move |e| e.name == name)
    }

    /// The token covering byte `pos`.
    pub fn token_at(&self, pos: usize) -> Option<&Token> {
        let idx = self.tokens.partition_point(|t| t.range.end <= pos);
        self.tokens.get(idx).filter(|t| t.range.contains(&pos))
    }

    /// Whether `pos` falls inside visible text rather than a tag or comment.
    pub fn in_text(&self, pos: usize) -> bool {
        self.token_at(pos).map_or(false, |t| t.kind == TokenKind::Text)
    }

    pub fn text_tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|t| t.kind == TokenKind::Text)
    }

    /// Grows `range` until every element it touches is wholly inside it.
    /// Fails when that would leave `limit`.
    pub fn balance(&self, range: Range<usize>, limit: &Range<usize>) -> Option<Range<usize>> {
        let (mut start, mut end) = (range.start, range.end);
        loop {
            let mut changed = false;
            for element in &self.elements {
                let outer = element.outer();
                let opens_inside = start <= element.open.start && element.open.start < end;
                let closes_inside = element
                    .close
                    .as_ref()
                    .map_or(false, |c| start <= c.start && c.start < end);

                if opens_inside && outer.end > end {
                    end = outer.end;
                    changed = true;
                }
                if closes_inside && element.open.start < start {
                    start = element.open.start;
                    changed = true;
                }
            }
            if start < limit.start || end > limit.end {
                return None;
            }
            if !changed {
                return Some(start..end);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_ranges() {
        let src = "<div><p>Hi <b>there</b></p></div>";
        let tree = MarkupTree::parse(src, 512).unwrap();
        let names: Vec<&str> = tree.elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["div", "p", "b"]);
        let p = &tree.elements[1];
        assert_eq!(&src[p.inner.clone()], "Hi <b>there</b>");
        assert_eq!(&src[p.outer()], "<p>Hi <b>there</b></p>");
        assert_eq!(p.depth, 1);
    }

    #[test]
    fn test_implicit_close_and_stray_tags() {
        let src = "<ul><li>one<li>two</ul></span>tail";
        let tree = MarkupTree::parse(src, 512).unwrap();
        let first_li = &tree.elements[1];
        assert!(first_li.close.is_none());
        assert_eq!(first_li.inner.end, src.find("</ul>").unwrap());
        assert_eq!(tree.elements.len(), 3);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            MarkupTree::parse("<p>ok <!-- open", 512),
            Err(ParserError::MalformedMarkup(_))
        ));
        let deep = "<span>".repeat(20);
        assert!(matches!(
            MarkupTree::parse(&deep, 10),
            Err(ParserError::NestingTooDeep(10))
        ));
    }

    #[test]
    fn test_smallest_containing_and_in_text() {
        let src = "<div><p>Alpha <a href=\"#x\">beta</a> gamma</p></div>";
        let tree = MarkupTree::parse(src, 512).unwrap();
        let start = src.find("beta").unwrap();
        let container = tree.smallest_containing(&(start..start + 4)).unwrap();
        assert_eq!(container.name, "a");

        let start = src.find("Alpha").unwrap();
        let end = src.find("gamma").unwrap() + 5;
        assert_eq!(tree.smallest_containing(&(start..end)).unwrap().name, "p");

        assert!(tree.in_text(start));
        assert!(!tree.in_text(src.find("href").unwrap()));
    }

    #[test]
    fn test_balance_expands_to_whole_elements() {
        let src = "<p>Alpha <a href=\"#x\">beta</a> gamma</p>";
        let tree = MarkupTree::parse(src, 512).unwrap();
        let p = tree.elements[0].inner.clone();

        // "Alpha <a href=\"#x\">be" opens <a> without closing it
        let start = src.find("Alpha").unwrap();
        let end = src.find("beta").unwrap() + 2;
        let balanced = tree.balance(start..end, &p).unwrap();
        assert_eq!(&src[balanced], "Alpha <a href=\"#x\">beta</a>");

        // "ta</a> gam" closes <a> opened before it
        let start = src.find("ta</a>").unwrap();
        let end = src.find("gamma").unwrap() + 3;
        let balanced = tree.balance(start..end, &p).unwrap();
        assert_eq!(&src[balanced], "<a href=\"#x\">beta</a> gam");

        // Crossing the paragraph itself is refused
        assert!(tree.balance(0..5, &p).is_none());
    }
}
