// Per-item CSV report of a batch run

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use log::debug;

use crate::error::Result;
use crate::pipeline::{ItemOutcome, WorkItem};

const HEADER: [&str; 8] = [
    "item_id",
    "claim_page",
    "evidence_page",
    "claim_outcome",
    "claim_tier",
    "evidence_outcome",
    "evidence_tier",
    "success",
];

pub struct RunReport {
    writer: csv::Writer<BufWriter<File>>,
    path: PathBuf,
    rows: usize,
}

impl RunReport {
    /// Opens the report at `path`. A directory gets a timestamped file inside it.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let path = if path.is_dir() {
            let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            path.join(format!("highlight_report_{}.csv", timestamp))
        } else {
            path.to_path_buf()
        };

        let file = File::create(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(BufWriter::new(file));
        writer.write_record(HEADER)?;

        debug!("Writing run report to {:?}", path);
        Ok(Self { writer, path, rows: 0 })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn record(&mut self, item: &WorkItem, outcome: &ItemOutcome) -> Result<()> {
        let claim_tier = outcome.claim.tier().map(|t| t.as_str()).unwrap_or("");
        let evidence_tier = outcome.evidence.tier().map(|t| t.as_str()).unwrap_or("");
        self.writer.write_record([
            item.id.as_str(),
            item.claim.page_key.as_deref().unwrap_or(""),
            item.evidence.page_key.as_deref().unwrap_or(""),
            outcome.claim.label(),
            claim_tier,
            outcome.evidence.label(),
            evidence_tier,
            if outcome.is_success() { "true" } else { "false" },
        ])?;
        self.rows += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        Ok(self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{SideInput, SideOutcome};
    use crate::types::{MatchTier, TargetPassage};

    #[test]
    fn test_report_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = RunReport::create(dir.path()).unwrap();
        assert!(report.path().starts_with(dir.path()));

        let item = WorkItem {
            id: "7".to_string(),
            claim: SideInput::new("Moon", TargetPassage::new("x")),
            evidence: SideInput { page_key: None, target: TargetPassage::new("y") },
            record: None,
        };
        let outcome = ItemOutcome {
            claim: SideOutcome::HighlightFailed { tier: MatchTier::Keyword },
            evidence: SideOutcome::InputUnavailable,
        };
        report.record(&item, &outcome).unwrap();
        assert_eq!(report.rows(), 1);
        let path = report.finish().unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], HEADER.join(","));
        assert_eq!(lines[1], "7,Moon,,highlight_failed,keyword,input_unavailable,,false");
    }
}
