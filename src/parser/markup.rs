// Lossless tokenizer for HTML-like markup.

use ahash::AHashSet;
use lazy_static::lazy_static;
use memchr::{memchr, memmem};
use std::ops::Range;

use super::entities::decode_entity_at;
use super::TextMapping;

lazy_static! {
    static ref BLOCK_ELEMENTS: AHashSet<&'static str> = [
        "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul", "ol",
        "section", "article", "header", "footer", "main", "aside",
        "figure", "figcaption", "blockquote", "pre", "table", "tr", "td", "th",
    ].into_iter().collect();

    static ref VOID_ELEMENTS: AHashSet<&'static str> = [
        "img", "br", "hr", "input", "meta", "link", "area", "base",
        "col", "embed", "source", "track", "wbr",
    ].into_iter().collect();
}

const RAW_TEXT_ELEMENTS: [&str; 4] = ["script", "style", "textarea", "title"];

pub fn is_block_element(name: &str) -> bool {
    BLOCK_ELEMENTS.contains(name)
}

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(name)
}

pub fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    OpenTag { name: String, self_closing: bool },
    CloseTag { name: String },
    Comment,
    /// `<!DOCTYPE ...>`, `<![CDATA[...]]>` or `<?...?>`.
    Declaration,
    Text,
    /// Contents of `script`, `style`, `textarea` or `title`.
    RawText,
    /// A construct opened with `<` that never closes. Always runs to the end of input.
    Unterminated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: Range<usize>,
}

impl Token {
    pub fn is_tag(&self) -> bool {
        matches!(self.kind, TokenKind::OpenTag { .. } | TokenKind::CloseTag { .. })
    }

    /// An open tag that will be followed by a matching close tag.
    pub fn opens_element(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::OpenTag { name, self_closing: false } if !is_void_element(name) => Some(name),
            _ => None,
        }
    }

    pub fn tag_name(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::OpenTag { name, .. } | TokenKind::CloseTag { name } => Some(name),
            _ => None,
        }
    }
}

/// Splits markup into tokens covering every byte exactly once.
pub struct MarkupLexer<'a> {
    src: &'a str,
    pos: usize,
    raw_until: Option<String>,
}

impl<'a> MarkupLexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0, raw_until: None }
    }

    fn starts_markup(&self, at: usize) -> bool {
        let bytes = self.src.as_bytes();
        match bytes.get(at + 1) {
            Some(b'!') | Some(b'?') => true,
            Some(b'/') => bytes.get(at + 2).map_or(false, |b| b.is_ascii_alphabetic()),
            Some(b) => b.is_ascii_alphabetic(),
            None => false,
        }
    }

    fn lex_text(&mut self) -> Token {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        let mut cursor = start;
        loop {
            match memchr(b'<', &bytes[cursor..]) {
                Some(offset) => {
                    let at = cursor + offset;
                    if at > start && self.starts_markup(at) {
                        self.pos = at;
                        break;
                    }
                    cursor = at + 1;
                }
                None => {
                    self.pos = bytes.len();
                    break;
                }
            }
        }
        Token { kind: TokenKind::Text, range: start..self.pos }
    }

    fn lex_raw_text(&mut self, element: &str) -> Option<Token> {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        let mut cursor = start;
        let end = loop {
            match memmem::find(&bytes[cursor..], b"</") {
                Some(offset) => {
                    let at = cursor + offset;
                    let name_end = at + 2 + element.len();
                    if name_end <= bytes.len()
                        && bytes[at + 2..name_end].eq_ignore_ascii_case(element.as_bytes())
                    {
                        break at;
                    }
                    cursor = at + 2;
                }
                None => break bytes.len(),
            }
        };
        self.pos = end;
        (end > start).then(|| Token { kind: TokenKind::RawText, range: start..end })
    }

    fn unterminated(&mut self, start: usize) -> Token {
        self.pos = self.src.len();
        Token { kind: TokenKind::Unterminated, range: start..self.pos }
    }

    fn lex_markup(&mut self) -> Token {
        let start = self.pos;
        let rest = &self.src[start..];

        if rest.starts_with("<!--") {
            return match memmem::find(rest[4..].as_bytes(), b"-->") {
                Some(offset) => {
                    self.pos = start + 4 + offset + 3;
                    Token { kind: TokenKind::Comment, range: start..self.pos }
                }
                None => self.unterminated(start),
            };
        }

        if rest.starts_with("<![CDATA[") {
            return match memmem::find(rest.as_bytes(), b"]]>") {
                Some(offset) => {
                    self.pos = start + offset + 3;
                    Token { kind: TokenKind::Declaration, range: start..self.pos }
                }
                None => self.unterminated(start),
            };
        }

        if rest.starts_with("<!") || rest.starts_with("<?") {
            return match memchr(b'>', rest.as_bytes()) {
                Some(offset) => {
                    self.pos = start + offset + 1;
                    Token { kind: TokenKind::Declaration, range: start..self.pos }
                }
                None => self.unterminated(start),
            };
        }

        let closing = rest.starts_with("</");
        let name_start = if closing { 2 } else { 1 };
        let name_len = rest[name_start..]
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'-' || *b == b':')
            .count();
        let name = rest[name_start..name_start + name_len].to_ascii_lowercase();

        let end = match tag_end(rest, name_start + name_len) {
            Some(end) => end,
            None => return self.unterminated(start),
        };

        self.pos = start + end + 1;
        let range = start..self.pos;
        if closing {
            return Token { kind: TokenKind::CloseTag { name }, range };
        }

        let self_closing = rest[..end].trim_end().ends_with('/');
        if !self_closing && is_raw_text_element(&name) {
            self.raw_until = Some(name.clone());
        }
        Token { kind: TokenKind::OpenTag { name, self_closing }, range }
    }
}

impl<'a> Iterator for MarkupLexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if let Some(element) = self.raw_until.take() {
            if let Some(token) = self.lex_raw_text(&element) {
                return Some(token);
            }
        }
        if self.pos >= self.src.len() {
            return None;
        }
        if self.src.as_bytes()[self.pos] == b'<' && self.starts_markup(self.pos) {
            Some(self.lex_markup())
        } else {
            Some(self.lex_text())
        }
    }
}

/// Offset of the `>` closing a tag whose attributes start at `from`.
/// Quoted attribute values may contain `>`.
fn tag_end(tag: &str, from: usize) -> Option<usize> {
    let bytes = tag.as_bytes();
    let mut quote: Option<u8> = None;
    let mut after_equals = false;
    for (i, &b) in bytes.iter().enumerate().skip(from) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'>' => return Some(i),
                b'"' | b'\'' if after_equals => quote = Some(b),
                b'=' => after_equals = true,
                b if b.is_ascii_whitespace() => {}
                _ => after_equals = false,
            },
        }
        if quote.is_some() {
            after_equals = false;
        }
    }
    None
}

/// Visible text: tags become spaces, raw-text elements vanish,
/// references are decoded and whitespace runs collapse to one space.
pub fn visible_text(src: &str) -> String {
    let mut out = String::with_capacity(src.len() / 2);
    for token in MarkupLexer::new(src) {
        match token.kind {
            TokenKind::Text => out.push_str(&super::decode_entities(&src[token.range])),
            TokenKind::RawText | TokenKind::Comment | TokenKind::Declaration => {}
            _ => out.push(' '),
        }
    }
    collapse_whitespace(&out)
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased visible text with all whitespace removed, mapped back to source bytes.
///
/// Only text tokens contribute; a decoded reference maps to the whole
/// reference in the source.
pub fn folded_text(src: &str) -> TextMapping {
    let mut mapping = TextMapping::default();
    for token in MarkupLexer::new(src) {
        if token.kind != TokenKind::Text {
            continue;
        }
        let text = &src[token.range.clone()];
        let mut offset = 0;
        while offset < text.len() {
            let abs = token.range.start + offset;
            let (decoded, consumed) = if text.as_bytes()[offset] == b'&' {
                decode_entity_at(text, offset).unwrap_or_else(|| ("&".to_string(), 1))
            } else {
                let c = text[offset..].chars().next().unwrap_or(' ');
                (c.to_string(), c.len_utf8())
            };
            for c in decoded.chars().filter(|c| !c.is_whitespace()).flat_map(char::to_lowercase) {
                mapping.cleaned_text.push(c);
                mapping.char_map.push((abs, abs + consumed));
            }
            offset += consumed;
        }
    }
    mapping
}

/// Lowercase with whitespace removed, the comparison key for [`folded_text`].
/// Expects already decoded text.
pub fn fold(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        MarkupLexer::new(src).map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokens_cover_input() {
        let src = "<!DOCTYPE html><p class=\"a>b\">Hi <b>there</b><br/>a < b<!-- c --></p>";
        let tokens: Vec<Token> = MarkupLexer::new(src).collect();
        let rebuilt: String = tokens.iter().map(|t| &src[t.range.clone()]).collect();
        assert_eq!(rebuilt, src);
        assert_eq!(tokens[0].kind, TokenKind::Declaration);
        assert_eq!(
            tokens[1].kind,
            TokenKind::OpenTag { name: "p".to_string(), self_closing: false }
        );
        assert_eq!(&src[tokens[1].range.clone()], "<p class=\"a>b\">");
        assert!(tokens.iter().any(|t| t.kind
            == TokenKind::OpenTag { name: "br".to_string(), self_closing: true }));
    }

    #[test]
    fn test_raw_text_elements() {
        let src = "<script>if (a < b) { x = '</p>'; }</script><p>x</p>";
        let k = kinds(src);
        assert_eq!(k[1], TokenKind::RawText);
        assert_eq!(k[2], TokenKind::CloseTag { name: "script".to_string() });
        assert_eq!(k[3], TokenKind::OpenTag { name: "p".to_string(), self_closing: false });
    }

    #[test]
    fn test_single_quoted_attribute() {
        let src = "<a title='x > y' href=\"/w\">link</a>";
        let tokens: Vec<Token> = MarkupLexer::new(src).collect();
        assert_eq!(&src[tokens[0].range.clone()], "<a title='x > y' href=\"/w\">");
        assert_eq!(tokens[1].kind, TokenKind::Text);
    }

    #[test]
    fn test_unterminated() {
        let k = kinds("text <p class=\"open");
        assert_eq!(k, vec![TokenKind::Text, TokenKind::Unterminated]);
        let k = kinds("<!-- never closed");
        assert_eq!(k, vec![TokenKind::Unterminated]);
    }

    #[test]
    fn test_element_sets() {
        assert!(is_block_element("p"));
        assert!(is_block_element("blockquote"));
        assert!(!is_block_element("div"));
        assert!(!is_block_element("span"));
        assert!(is_void_element("br"));
        assert!(!is_void_element("a"));
    }

    #[test]
    fn test_visible_text() {
        let src = "<head><style>p{}</style></head><p>Caf&eacute;\n  <a href=\"#\">bar</a>[1]</p>";
        assert_eq!(visible_text(src), "Café bar [1]");
    }

    #[test]
    fn test_folded_text_maps_to_source() {
        let src = "<p>Ab <i>C&amp;d</i></p>";
        let mapping = folded_text(src);
        assert_eq!(mapping.cleaned_text, "abc&d");
        let range = mapping.source_range(2, 5).unwrap();
        assert_eq!(&src[range], "C&amp;d");
        assert_eq!(fold("C & D"), "c&d");
    }
}
