// src/config/subsystems/highlighter.rs

use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::{FromIni, parse_value, unquote};
use crate::types::MatchTier;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlighterConfig {
    pub class_exact: String,
    pub class_fuzzy: String,
    pub class_keyword: String,
    pub class_paragraph: String,
    pub id_prefix: String,
    pub paragraph_id_prefix: String,
    pub id_modulus: u64,
    pub inject_assets: bool,
    pub style_element_id: String,
    pub scroll_delay_ms: u64,
    /// Documents nested deeper than this are rejected as malformed.
    pub max_depth: usize,
}

impl Default for HighlighterConfig {
    fn default() -> Self {
        Self {
            class_exact: "wikifix-highlight-exact".to_string(),
            class_fuzzy: "wikifix-highlight-fuzzy".to_string(),
            class_keyword: "wikifix-highlight-keyword".to_string(),
            class_paragraph: "wikifix-highlight-paragraph".to_string(),
            id_prefix: "highlighted-text-wikifix".to_string(),
            paragraph_id_prefix: "highlighted-paragraph".to_string(),
            id_modulus: 10_000,
            inject_assets: true,
            style_element_id: "wikifix-highlight-styles".to_string(),
            scroll_delay_ms: 500,
            max_depth: 512,
        }
    }
}

impl FromIni for HighlighterConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "highlighter" {
            return None;
        }

        let result = match key {
            "class_exact" => { self.class_exact = unquote(value); Ok(()) },
            "class_fuzzy" => { self.class_fuzzy = unquote(value); Ok(()) },
            "class_keyword" => { self.class_keyword = unquote(value); Ok(()) },
            "class_paragraph" => { self.class_paragraph = unquote(value); Ok(()) },
            "id_prefix" => { self.id_prefix = unquote(value); Ok(()) },
            "paragraph_id_prefix" => { self.paragraph_id_prefix = unquote(value); Ok(()) },
            "style_element_id" => { self.style_element_id = unquote(value); Ok(()) },
            "id_modulus" => match parse_value::<u64>(key, value) {
                Ok(modulus) if modulus > 0 => { self.id_modulus = modulus; Ok(()) },
                _ => Err(Error::Config(
                    format!("Invalid id_modulus (must be > 0): {}", value)
                )),
            },
            "inject_assets" => parse_value(key, value).map(|v| self.inject_assets = v),
            "scroll_delay_ms" => parse_value(key, value).map(|v| self.scroll_delay_ms = v),
            "max_depth" => match parse_value::<usize>(key, value) {
                Ok(depth) if depth > 0 => { self.max_depth = depth; Ok(()) },
                _ => Err(Error::Config(
                    format!("Invalid max_depth (must be > 0): {}", value)
                )),
            },
            _ => return None,
        };

        Some(result)
    }
}

impl HighlighterConfig {
    pub fn validate(&self) -> Result<()> {
        for class in [&self.class_exact, &self.class_fuzzy, &self.class_keyword, &self.class_paragraph] {
            if class.is_empty() || class.chars().any(|c| c.is_whitespace() || c == '"') {
                return Err(Error::Config(format!("Invalid highlight class name: {:?}", class)));
            }
        }
        if self.id_modulus == 0 {
            return Err(Error::Config("id_modulus must be > 0".to_string()));
        }
        Ok(())
    }

    /// Style class used for a span located by `tier`.
    pub fn class_for(&self, tier: MatchTier) -> &str {
        match tier {
            MatchTier::Exact => &self.class_exact,
            MatchTier::Sentence | MatchTier::Fuzzy | MatchTier::Context => &self.class_fuzzy,
            MatchTier::Keyword => &self.class_keyword,
            MatchTier::Paragraph => &self.class_paragraph,
        }
    }
}
