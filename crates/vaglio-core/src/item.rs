// ABOUTME: Defines the Block and Document work items and their review statuses.
// ABOUTME: Unknown JSON fields are carried through untouched so persisted files keep their payload.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lease::Leasable;

/// Review status of a question block. A status string this crate does not
/// know is kept verbatim in `Other`; such a block is never handed out and is
/// counted as pending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Other(String),
}

impl BlockStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BlockStatus::Pending => "pending",
            BlockStatus::InProgress => "in_progress",
            BlockStatus::Completed => "completed",
            BlockStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for BlockStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => BlockStatus::Pending,
            "in_progress" => BlockStatus::InProgress,
            "completed" => BlockStatus::Completed,
            _ => BlockStatus::Other(raw),
        }
    }
}

impl From<BlockStatus> for String {
    fn from(status: BlockStatus) -> Self {
        match status {
            BlockStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review status of a document. Documents start `pending`, become `in_queue`
/// once their question block has been completed, and are leased from there.
/// Unrecognised strings survive in `Other` and are never leased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocumentStatus {
    #[default]
    Pending,
    InQueue,
    InProgress,
    Validated,
    Removed,
    Other(String),
}

impl DocumentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::InQueue => "in_queue",
            DocumentStatus::InProgress => "in_progress",
            DocumentStatus::Validated => "validated",
            DocumentStatus::Removed => "removed",
            DocumentStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for DocumentStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => DocumentStatus::Pending,
            "in_queue" => DocumentStatus::InQueue,
            "in_progress" => DocumentStatus::InProgress,
            "validated" => DocumentStatus::Validated,
            "removed" => DocumentStatus::Removed,
            _ => DocumentStatus::Other(raw),
        }
    }
}

impl From<DocumentStatus> for String {
    fn from(status: DocumentStatus) -> Self {
        match status {
            DocumentStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry of a block's related-question list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedQuestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A block of questions handed to a reviewer as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id_domanda: i64,
    #[serde(default)]
    pub status: BlockStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_in_progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domande_correlate: Option<Vec<RelatedQuestion>>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Block {
    /// Create a pending block with no payload.
    pub fn new(id_domanda: i64) -> Self {
        Self {
            id_domanda,
            status: BlockStatus::Pending,
            timestamp_in_progress: None,
            domande_correlate: None,
            fields: Map::new(),
        }
    }

    /// Drop related questions whose id satisfies `excluded`.
    pub fn retain_related(&mut self, excluded: impl Fn(i64) -> bool) {
        if let Some(related) = self.domande_correlate.as_mut() {
            related.retain(|q| q.id.is_none_or(|id| !excluded(id)));
        }
    }
}

impl Leasable for Block {
    fn id(&self) -> i64 {
        self.id_domanda
    }

    fn is_leased(&self) -> bool {
        self.status == BlockStatus::InProgress
    }

    fn is_available(&self) -> bool {
        self.status == BlockStatus::Pending
    }

    fn lease_stamp(&self) -> Option<f64> {
        self.timestamp_in_progress
    }

    fn acquire(&mut self, now: f64) {
        self.status = BlockStatus::InProgress;
        self.timestamp_in_progress = Some(now);
    }

    fn release(&mut self) {
        self.status = BlockStatus::Pending;
        self.timestamp_in_progress = None;
    }
}

/// A question/answer document awaiting human validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_in_progress: Option<f64>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Create a document with the given status and no payload.
    pub fn new(id: i64, status: DocumentStatus) -> Self {
        Self {
            id,
            status,
            timestamp_in_progress: None,
            metadata: Map::new(),
            fields: Map::new(),
        }
    }

    /// Whether a reviewer flagged this document for the demo set.
    pub fn is_demo(&self) -> bool {
        self.metadata.get("add_demo").and_then(Value::as_bool) == Some(true)
    }

    /// Look up a payload field, returning `Value::Null` when absent.
    pub fn field(&self, key: &str) -> &Value {
        self.fields.get(key).unwrap_or(&Value::Null)
    }
}

impl Leasable for Document {
    fn id(&self) -> i64 {
        self.id
    }

    fn is_leased(&self) -> bool {
        self.status == DocumentStatus::InProgress
    }

    fn is_available(&self) -> bool {
        self.status == DocumentStatus::InQueue
    }

    fn lease_stamp(&self) -> Option<f64> {
        self.timestamp_in_progress
    }

    fn acquire(&mut self, now: f64) {
        self.status = DocumentStatus::InProgress;
        self.timestamp_in_progress = Some(now);
    }

    fn release(&mut self) {
        self.status = DocumentStatus::InQueue;
        self.timestamp_in_progress = None;
    }
}

/// The reviewer's verdict on a document, merged into its metadata on validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanValidation {
    pub human_question_validation: BTreeMap<String, String>,
    pub human_answer_validation: BTreeMap<String, String>,
    pub document_question_rating: i64,
    pub document_answer_rating: i64,
    #[serde(default)]
    pub add_demo: bool,
}

impl HumanValidation {
    /// Write every validation field into the given metadata object,
    /// overwriting earlier values with the same keys.
    pub fn merge_into(&self, metadata: &mut Map<String, Value>) {
        metadata.insert(
            "human_question_validation".to_string(),
            serde_json::json!(self.human_question_validation),
        );
        metadata.insert(
            "human_answer_validation".to_string(),
            serde_json::json!(self.human_answer_validation),
        );
        metadata.insert(
            "document_question_rating".to_string(),
            Value::from(self.document_question_rating),
        );
        metadata.insert(
            "document_answer_rating".to_string(),
            Value::from(self.document_answer_rating),
        );
        metadata.insert("add_demo".to_string(), Value::Bool(self.add_demo));
    }
}
