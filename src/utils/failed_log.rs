use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::Local;
use log::{debug, warn};
use parking_lot::Mutex;

use crate::pipeline::{ItemOutcome, SideInput, SideOutcome, WorkItem};

/// Append-only log of items that produced no highlight.
///
/// One tab-separated line per side:
/// `timestamp  item  side  outcome  tier  page  target`.
/// Empty columns are written as `-`.
pub struct FailedItemLog {
    file: Mutex<Option<File>>,
}

impl Default for FailedItemLog {
    fn default() -> Self {
        Self::new()
    }
}

impl FailedItemLog {
    pub fn new() -> Self {
        Self {
            file: Mutex::new(None),
        }
    }

    pub fn init(&self, path: &Path) -> io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        *self.file.lock() = Some(file);
        debug!("Initialized failed item log at {:?}", path);
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.file.lock().is_some()
    }

    /// Records both sides of an item when neither was highlighted.
    /// Returns the number of lines written.
    pub fn log_item(&self, item: &WorkItem, outcome: &ItemOutcome) -> io::Result<usize> {
        if outcome.is_success() {
            return Ok(0);
        }

        let mut guard = self.file.lock();
        let file = match guard.as_mut() {
            Some(file) => file,
            None => {
                warn!("Item {} not logged, failed log not initialized: {}", item.id, outcome.failure_reason());
                return Ok(0);
            }
        };

        let timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S");
        for (side, input, result) in [
            ("claim", &item.claim, &outcome.claim),
            ("evidence", &item.evidence, &outcome.evidence),
        ] {
            writeln!(file, "{}\t{}\t{}", timestamp, item.id, side_columns(side, input, result))?;
        }
        file.flush()?;
        Ok(2)
    }
}

fn side_columns(side: &str, input: &SideInput, outcome: &SideOutcome) -> String {
    let target = input.target.primary.split_whitespace().collect::<Vec<_>>().join(" ");
    [
        side,
        outcome.label(),
        outcome.tier().map_or("-", |t| t.as_str()),
        input.page_key.as_deref().unwrap_or("-"),
        if target.is_empty() { "-" } else { target.as_str() },
    ]
    .join("\t")
}

lazy_static::lazy_static! {
    pub static ref FAILED_LOG: FailedItemLog = FailedItemLog::new();
}
