pub mod file;
pub mod subsystems;

use serde::{Serialize, Deserialize};
use std::path::Path;
use std::str::FromStr;
use std::fs;
use crate::error::{Error, Result};
use log::{debug, warn, trace};

pub const DEFAULT_CONFIG: &str = "wikifix.ini";

pub trait FromIni {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WikifixConfig {
    // File paths
    pub files: file::FileConfig,

    // Subsystem configs
    pub segmenter: subsystems::SegmenterConfig,
    pub matcher: subsystems::MatcherConfig,
    pub highlighter: subsystems::HighlighterConfig,
    pub processor: subsystems::ProcessorConfig,
}

impl WikifixConfig {
    pub fn validate(&self) -> Result<()> {
        self.files.validate()?;
        self.segmenter.validate()?;
        self.matcher.validate()?;
        self.highlighter.validate()?;
        self.processor.validate()?;
        Ok(())
    }

    pub fn from_ini<P: AsRef<Path>>(path: P) -> Result<Self> {
        let absolute_path = fs::canonicalize(&path)
            .unwrap_or_else(|_| path.as_ref().to_path_buf());

        trace!("Loading configuration from: {:?}", absolute_path);

        let content = fs::read_to_string(&path)?;
        let config = Self::from_ini_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path`, or `wikifix.ini` in the working directory when no path
    /// is given, falling back to defaults. Callers validate after applying
    /// their own overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                debug!("Loading configuration from {:?}", path);
                Self::from_ini_str(&fs::read_to_string(path)?)
            }
            None if Path::new(DEFAULT_CONFIG).is_file() => {
                debug!("Loading configuration from {}", DEFAULT_CONFIG);
                Self::from_ini_str(&fs::read_to_string(DEFAULT_CONFIG)?)
            }
            None => {
                debug!("No configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parses INI text without validating paths on disk.
    pub fn from_ini_str(content: &str) -> Result<Self> {
        let mut config = Self::default();
        let mut current_section = String::new();

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                current_section = line[1..line.len() - 1].trim().to_string();
                trace!("  Line {}: Found section: [{}]", line_num + 1, current_section);
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();

                // Delegate to appropriate subsystem config
                let handled = match current_section.as_str() {
                    "files" | "file" => config.files.from_ini_section(&current_section, key, value),
                    "segmenter" => config.segmenter.from_ini_section(&current_section, key, value),
                    "matcher" => config.matcher.from_ini_section(&current_section, key, value),
                    "highlighter" => config.highlighter.from_ini_section(&current_section, key, value),
                    "processor" => config.processor.from_ini_section(&current_section, key, value),
                    _ => None,
                };

                match handled {
                    Some(Err(e)) => return Err(e),
                    Some(Ok(())) => debug!("    [{}] {} = {}", current_section, key, value),
                    None => warn!(
                        "Unrecognized config key: {}={} in section [{}]",
                        key, value, current_section
                    ),
                }
            } else {
                warn!("Ignoring malformed config line {}: {}", line_num + 1, line);
            }
        }

        Ok(config)
    }
}

/// Parses a single INI value, reporting the key on failure.
pub(crate) fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim_matches('"')
        .parse::<T>()
        .map_err(|_| Error::Config(format!("Invalid {} value: {}", key, value)))
}

/// Parses a value that must lie in `0.0..=1.0`.
pub(crate) fn parse_ratio(key: &str, value: &str) -> Result<f64> {
    match parse_value::<f64>(key, value)? {
        ratio if (0.0..=1.0).contains(&ratio) => Ok(ratio),
        _ => Err(Error::Config(format!(
            "Invalid {} (must be between 0 and 1): {}",
            key, value
        ))),
    }
}

pub(crate) fn unquote(value: &str) -> String {
    value.trim().trim_matches('"').to_string()
}
