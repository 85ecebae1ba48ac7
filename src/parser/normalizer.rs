// Canonical text form used for similarity comparisons

use lazy_static::lazy_static;
use regex::Regex;

use super::entities::decode_entities;

lazy_static! {
    static ref CITATION_SUP: Regex = Regex::new(r"(?is)<sup[^>]*>.*?</sup>").unwrap();
    static ref BRACKETED: Regex = Regex::new(r"\[[^\]]*\]").unwrap();
    static ref TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref SPACES: Regex = Regex::new(
        r"[\u{00A0}\u{2000}-\u{200B}\u{202F}\u{205F}\u{3000}]"
    ).unwrap();
    static ref DASHES: Regex = Regex::new(r"[\u{2010}-\u{2015}\u{2212}]").unwrap();
    static ref SINGLE_QUOTES: Regex = Regex::new(
        r"[\u{2018}\u{2019}\u{201A}\u{201B}\u{2032}\u{2035}]"
    ).unwrap();
    static ref DOUBLE_QUOTES: Regex = Regex::new(r"[\u{201C}-\u{201F}\u{2033}\u{2036}]").unwrap();
    static ref NON_WORD: Regex = Regex::new(r"[^\w\s]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Lowercased, citation-free, punctuation-free text with single spaces.
    pub fn normalize(&self, text: &str) -> String {
        let text = text.to_lowercase();
        let text = CITATION_SUP.replace_all(&text, "");
        let text = BRACKETED.replace_all(&text, "");
        let text = TAG.replace_all(&text, "");
        // References may decode to uppercase letters
        let text = decode_entities(&text).to_lowercase();
        let text = SPACES.replace_all(&text, " ");
        let text = DASHES.replace_all(&text, "-");
        let text = SINGLE_QUOTES.replace_all(&text, "'");
        let text = DOUBLE_QUOTES.replace_all(&text, "\"");
        let text = NON_WORD.replace_all(&text, "");
        WHITESPACE.replace_all(&text, " ").trim().to_string()
    }

    /// [`normalize`](Self::normalize) with every space removed.
    pub fn normalize_compact(&self, text: &str) -> String {
        self.normalize(text).replace(' ', "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citations_vanish() {
        let n = TextNormalizer::new();
        assert_eq!(
            n.normalize("Apollo 11<sup id=\"cite_ref-3\"><a href=\"#c\">[3]</a></sup> landed."),
            "apollo 11 landed"
        );
        assert_eq!(n.normalize("It rained[citation needed] often[1]."), "it rained often");
    }

    #[test]
    fn test_dash_and_quote_variants_collapse() {
        let n = TextNormalizer::new();
        assert_eq!(n.normalize("café — “data"), "café data");
        assert_eq!(n.normalize("cafe - \"data"), "cafe data");
        assert_eq!(
            n.normalize("rock\u{2019}n\u{2010}roll"),
            n.normalize("rock'n-roll")
        );
    }

    #[test]
    fn test_entities_and_spaces() {
        let n = TextNormalizer::new();
        assert_eq!(n.normalize("&Eacute;cole&nbsp;Normale\u{200B}Sup"), "école normale sup");
        assert_eq!(n.normalize("  a \t\n b  "), "a b");
        assert_eq!(n.normalize_compact("The <b>Quick</b> fox"), "thequickfox");
    }

    #[test]
    fn test_idempotent_on_tricky_input() {
        let n = TextNormalizer::new();
        for input in ["&amp;amp; &lt;b&gt;X", "[a] <sup>b</sup> C", "&#65;&#x42;"] {
            let once = n.normalize(input);
            assert_eq!(n.normalize(&once), once, "input {:?}", input);
        }
    }
}
