// src/config/subsystems/matcher.rs

use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::{FromIni, parse_value, parse_ratio};

/// Which search procedure the matcher runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// The six-tier cascade, exact first and paragraph last.
    Cascade,
    /// Best-scoring content segment by token-sort similarity.
    Segment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    pub strategy: MatchStrategy,

    // Sentence tier
    pub sentence_min_target_len: usize,
    pub sentence_min_len: usize,
    pub sentence_min_words: usize,

    // Fuzzy tier
    pub fuzzy_threshold: f64,
    pub fuzzy_min_sentence_len: usize,

    // Context tier
    pub context_threshold: f64,
    pub context_min_len: usize,
    pub context_min_sentence_len: usize,

    // Keyword tier
    pub keyword_min_word_len: usize,
    pub keyword_min_hits: usize,
    pub keyword_min_sentence_len: usize,
    pub stopwords: Vec<String>,

    // Paragraph tier
    pub paragraph_min_len: usize,
    pub paragraph_min_score: f64,
    pub paragraph_keyword_weight: f64,
    pub paragraph_similarity_weight: f64,
    pub paragraph_length_divisor: f64,
    pub paragraph_length_cap: f64,

    // Segment strategy
    pub segment_score_cutoff: f64,
    pub first_sentence_only: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            strategy: MatchStrategy::Cascade,
            sentence_min_target_len: 30,
            sentence_min_len: 10,
            sentence_min_words: 3,
            fuzzy_threshold: 0.75,
            fuzzy_min_sentence_len: 20,
            context_threshold: 0.6,
            context_min_len: 50,
            context_min_sentence_len: 30,
            keyword_min_word_len: 4,
            keyword_min_hits: 2,
            keyword_min_sentence_len: 20,
            stopwords: [
                "this", "that", "with", "from", "they", "them", "were",
                "been", "have", "will", "would", "could", "should",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            paragraph_min_len: 50,
            paragraph_min_score: 1.0,
            paragraph_keyword_weight: 10.0,
            paragraph_similarity_weight: 5.0,
            paragraph_length_divisor: 1000.0,
            paragraph_length_cap: 2.0,
            segment_score_cutoff: 10.0,
            first_sentence_only: true,
        }
    }
}

impl FromIni for MatcherConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "matcher" {
            return None;
        }

        let result = match key {
            "strategy" => {
                let strategy = value.trim_matches('"').to_lowercase();
                match strategy.as_str() {
                    "cascade" => { self.strategy = MatchStrategy::Cascade; Ok(()) },
                    "segment" => { self.strategy = MatchStrategy::Segment; Ok(()) },
                    _ => Err(Error::Config(
                        format!("Invalid strategy (must be 'cascade' or 'segment'): {}", value)
                    )),
                }
            },
            "sentence_min_target_len" => parse_value(key, value).map(|v| self.sentence_min_target_len = v),
            "sentence_min_len" => parse_value(key, value).map(|v| self.sentence_min_len = v),
            "sentence_min_words" => match parse_value::<usize>(key, value) {
                Ok(words) if words > 0 => { self.sentence_min_words = words; Ok(()) },
                _ => Err(Error::Config(
                    format!("Invalid sentence_min_words (must be > 0): {}", value)
                )),
            },
            "fuzzy_threshold" => parse_ratio(key, value).map(|v| self.fuzzy_threshold = v),
            "fuzzy_min_sentence_len" => parse_value(key, value).map(|v| self.fuzzy_min_sentence_len = v),
            "context_threshold" => parse_ratio(key, value).map(|v| self.context_threshold = v),
            "context_min_len" => parse_value(key, value).map(|v| self.context_min_len = v),
            "context_min_sentence_len" => parse_value(key, value).map(|v| self.context_min_sentence_len = v),
            "keyword_min_word_len" => parse_value(key, value).map(|v| self.keyword_min_word_len = v),
            "keyword_min_hits" => match parse_value::<usize>(key, value) {
                Ok(hits) if hits > 0 => { self.keyword_min_hits = hits; Ok(()) },
                _ => Err(Error::Config(
                    format!("Invalid keyword_min_hits (must be > 0): {}", value)
                )),
            },
            "keyword_min_sentence_len" => parse_value(key, value).map(|v| self.keyword_min_sentence_len = v),
            "stopwords" => {
                self.stopwords = value
                    .trim_matches('"')
                    .split(',')
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect();
                Ok(())
            },
            "paragraph_min_len" => parse_value(key, value).map(|v| self.paragraph_min_len = v),
            "paragraph_min_score" => parse_value(key, value).map(|v| self.paragraph_min_score = v),
            "paragraph_keyword_weight" => parse_value(key, value).map(|v| self.paragraph_keyword_weight = v),
            "paragraph_similarity_weight" => parse_value(key, value).map(|v| self.paragraph_similarity_weight = v),
            "paragraph_length_divisor" => match parse_value::<f64>(key, value) {
                Ok(divisor) if divisor > 0.0 => { self.paragraph_length_divisor = divisor; Ok(()) },
                _ => Err(Error::Config(
                    format!("Invalid paragraph_length_divisor (must be > 0): {}", value)
                )),
            },
            "paragraph_length_cap" => parse_value(key, value).map(|v| self.paragraph_length_cap = v),
            "segment_score_cutoff" => match parse_value::<f64>(key, value) {
                Ok(cutoff) if (0.0..=100.0).contains(&cutoff) => { self.segment_score_cutoff = cutoff; Ok(()) },
                _ => Err(Error::Config(
                    format!("Invalid segment_score_cutoff (must be between 0 and 100): {}", value)
                )),
            },
            "first_sentence_only" => parse_value(key, value).map(|v| self.first_sentence_only = v),
            _ => return None,
        };

        Some(result)
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fuzzy_threshold < self.context_threshold {
            log::warn!(
                "fuzzy_threshold {} is looser than context_threshold {}; the context tier will rarely run",
                self.fuzzy_threshold, self.context_threshold
            );
        }
        if self.paragraph_length_divisor <= 0.0 {
            return Err(Error::Config("paragraph_length_divisor must be > 0".to_string()));
        }
        if self.keyword_min_hits == 0 {
            return Err(Error::Config("keyword_min_hits must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.iter().any(|s| s == word)
    }
}
