// src/config/subsystems/segmenter.rs

use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::{FromIni, parse_value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Chunks whose trimmed length falls below this are not offered to the matcher.
    pub min_segment_len: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_segment_len: 15,
        }
    }
}

impl FromIni for SegmenterConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "segmenter" {
            return None;
        }

        match key {
            "min_segment_len" => Some(parse_value(key, value).map(|v| self.min_segment_len = v)),
            _ => None,
        }
    }
}

impl SegmenterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_segment_len > 10_000 {
            return Err(Error::Config(format!(
                "min_segment_len {} would discard every sentence",
                self.min_segment_len
            )));
        }
        Ok(())
    }
}
