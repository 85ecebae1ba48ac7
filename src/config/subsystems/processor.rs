// src/config/subsystems/processor.rs

use serde::{Serialize, Deserialize};
use log::{warn, LevelFilter};
use crate::error::{Error, Result};
use crate::config::{FromIni, parse_value, unquote};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Worker threads; 0 means one per logical CPU.
    pub threads: usize,
    /// Parsed documents kept in memory across items that share a page.
    pub cache_capacity: usize,
    pub channel_capacity: usize,
    pub skip_failed_items: bool,
    pub rewrite_links: bool,
    pub api_prefix: String,
    pub log_level: String,
    pub show_progress: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            cache_capacity: 64,
            channel_capacity: 64,
            skip_failed_items: true,
            rewrite_links: true,
            api_prefix: "/api".to_string(),
            log_level: "info".to_string(),
            show_progress: true,
        }
    }
}

impl FromIni for ProcessorConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "processor" {
            return None;
        }

        let result = match key {
            "threads" => parse_value(key, value).map(|v| self.threads = v),
            "cache_capacity" => parse_value(key, value).map(|v| self.cache_capacity = v),
            "channel_capacity" => match parse_value::<usize>(key, value) {
                Ok(capacity) if capacity > 0 => { self.channel_capacity = capacity; Ok(()) },
                _ => Err(Error::Config(
                    format!("Invalid channel_capacity (must be > 0): {}", value)
                )),
            },
            "skip_failed_items" => parse_value(key, value).map(|v| self.skip_failed_items = v),
            "rewrite_links" => parse_value(key, value).map(|v| self.rewrite_links = v),
            "api_prefix" => { self.api_prefix = unquote(value).trim_end_matches('/').to_string(); Ok(()) },
            "log_level" => {
                let level = unquote(value).to_lowercase();
                match level.as_str() {
                    "trace" | "debug" | "info" | "warn" | "error" | "none" => {
                        self.log_level = level;
                        Ok(())
                    },
                    _ => Err(Error::Config(format!("Invalid log_level: {}", value))),
                }
            },
            "show_progress" => parse_value(key, value).map(|v| self.show_progress = v),
            _ => return None,
        };

        Some(result)
    }
}

impl ProcessorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.threads > num_cpus::get() * 4 {
            warn!(
                "threads = {} is far above the {} logical CPUs available",
                self.threads,
                num_cpus::get()
            );
        }
        if self.cache_capacity == 0 {
            warn!("cache_capacity = 0 disables the document cache");
        }
        Ok(())
    }

    pub fn get_log_level(&self) -> LevelFilter {
        match self.log_level.trim().to_lowercase().as_str() {
            "error" => LevelFilter::Error,
            "warn" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "debug" => LevelFilter::Debug,
            "trace" => LevelFilter::Trace,
            "none" => LevelFilter::Off,
            _ => LevelFilter::Info,
        }
    }

    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 { num_cpus::get() } else { self.threads }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_and_threads() {
        let mut config = ProcessorConfig::default();
        assert_eq!(config.get_log_level(), LevelFilter::Info);
        assert!(config.from_ini_section("processor", "log_level", "none").unwrap().is_ok());
        assert_eq!(config.get_log_level(), LevelFilter::Off);
        assert!(config.from_ini_section("processor", "log_level", "loud").unwrap().is_err());

        assert_eq!(config.effective_threads(), num_cpus::get());
        config.threads = 3;
        assert_eq!(config.effective_threads(), 3);
    }

    #[test]
    fn test_api_prefix_trailing_slash() {
        let mut config = ProcessorConfig::default();
        config.from_ini_section("processor", "api_prefix", "\"/mirror/\"").unwrap().unwrap();
        assert_eq!(config.api_prefix, "/mirror");
        assert!(config.from_ini_section("processor", "channel_capacity", "0").unwrap().is_err());
        assert!(config.from_ini_section("matcher", "threads", "2").is_none());
    }
}
