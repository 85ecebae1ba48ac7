// src/config/file.rs

use serde::{Serialize, Deserialize};
use std::path::PathBuf;
use crate::error::{Error, Result};
use super::FromIni;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    /// Root of the saved-site mirror holding cached article markup.
    pub saved_site_dir: PathBuf,
    pub input_file: Option<PathBuf>,
    pub output_file: PathBuf,
    pub report_file: Option<PathBuf>,
    pub failed_log: Option<PathBuf>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            saved_site_dir: PathBuf::from("saved_site"),
            input_file: None,
            output_file: PathBuf::from("data/highlighted.jsonl"),
            report_file: None,
            failed_log: None,
        }
    }
}

impl FromIni for FileConfig {
    fn from_ini_section(&mut self, _section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        let path = PathBuf::from(value.trim_matches('"'));
        match key {
            "saved_site_dir" => self.saved_site_dir = path,
            "input_file" => self.input_file = Some(path),
            "output_file" => self.output_file = path,
            "report_file" => self.report_file = Some(path),
            "failed_log" => self.failed_log = Some(path),
            _ => return None,
        }
        Some(Ok(()))
    }
}

impl FileConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.saved_site_dir.exists() {
            return Err(Error::Config(
                format!("Saved site directory does not exist: {:?}", self.saved_site_dir)
            ));
        }
        if let Some(input) = &self.input_file {
            if !input.exists() {
                return Err(Error::Config(
                    format!("Input file does not exist: {:?}", input)
                ));
            }
        }

        // Create output directories if they don't exist
        for path in [Some(&self.output_file), self.report_file.as_ref(), self.failed_log.as_ref()]
            .into_iter()
            .flatten()
        {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        Ok(())
    }
}
