// Input records and per-item work units

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{MatchTier, TargetPassage};
use crate::utils::url::page_key_from_url;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmReport {
    #[serde(default)]
    pub analysis: String,
    #[serde(default)]
    pub contradiction_type: String,
}

/// One claim/evidence pair as produced by the contradiction-finding stage.
///
/// Fields this crate does not use are kept in `extra` and written back out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    #[serde(default)]
    pub claim: String,
    #[serde(default)]
    pub claim_context: String,
    #[serde(default)]
    pub document_title: String,
    #[serde(default)]
    pub claim_text_span: String,
    #[serde(default)]
    pub document_url: String,
    #[serde(default)]
    pub evidence_sentence: String,
    #[serde(default)]
    pub evidence: String,
    #[serde(default)]
    pub evidence_document_title: String,
    #[serde(default)]
    pub evidence_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_report: Option<LlmReport>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ItemRecord {
    /// The record's own `id` field if it has one.
    pub fn record_id(&self) -> Option<String> {
        match self.extra.get("id")? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}

/// One side of an item: where to look and what to look for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideInput {
    pub page_key: Option<String>,
    pub target: TargetPassage,
}

impl SideInput {
    pub fn new<K: Into<String>>(page_key: K, target: TargetPassage) -> Self {
        Self {
            page_key: Some(page_key.into()),
            target,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkItem {
    pub id: String,
    pub claim: SideInput,
    pub evidence: SideInput,
    pub record: Option<ItemRecord>,
}

impl WorkItem {
    /// Claim side searches for the claim span in the claim page, evidence
    /// side for the evidence sentence in the evidence page.
    pub fn from_record(index: usize, record: ItemRecord) -> Self {
        let claim = SideInput {
            page_key: page_key_from_url(&record.document_url),
            target: TargetPassage::with_context(record.claim_text_span.clone(), record.claim_context.clone()),
        };
        let evidence = SideInput {
            page_key: page_key_from_url(&record.evidence_url),
            target: TargetPassage::with_context(record.evidence_sentence.clone(), record.evidence.clone()),
        };

        Self {
            id: record.record_id().unwrap_or_else(|| (index + 1).to_string()),
            claim,
            evidence,
            record: Some(record),
        }
    }
}

/// One JSONL output line of the batch tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightRecord {
    #[serde(flatten)]
    pub record: ItemRecord,
    pub claim_highlighted_html: Option<String>,
    pub evidence_highlighted_html: Option<String>,
    pub claim_success: bool,
    pub evidence_success: bool,
    pub claim_tier: Option<MatchTier>,
    pub evidence_tier: Option<MatchTier>,
}
