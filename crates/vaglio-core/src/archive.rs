// ABOUTME: The validated-document archive and the reviewer feedback log.
// ABOUTME: Both are append-mostly collections kept in memory and persisted whole through the job queue.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::error::{EngineError, Result};
use crate::item::Document;
use crate::job::JobQueue;

/// Reviewer-facing projection of an archived document.
#[derive(Debug, Clone, Serialize)]
pub struct FinalDocumentView {
    pub question: Value,
    pub answer: Value,
    pub answer_label: Value,
    pub answer_nina: Value,
    pub time_nina: Value,
    pub contest_nina: Value,
    pub metadata: Map<String, Value>,
    pub id: i64,
    pub index: usize,
    pub total: usize,
}

impl FinalDocumentView {
    fn new(doc: &Document, index: usize, total: usize) -> Self {
        let verbose = doc.field("nina_verbose_data");
        let or = |value: &Value, default: Value| {
            if value.is_null() { default } else { value.clone() }
        };

        Self {
            question: or(doc.field("question"), Value::from("")),
            answer: or(doc.field("answer"), Value::from("")),
            answer_label: or(doc.field("answer_label"), Value::Object(Map::new())),
            answer_nina: or(&verbose["answer"], Value::from("")),
            time_nina: or(&verbose["response_time"], Value::from(0)),
            contest_nina: or(&verbose["context"], Value::Array(Vec::new())),
            metadata: doc.metadata.clone(),
            id: doc.id,
            index,
            total,
        }
    }
}

/// Every document a reviewer has validated, in validation order.
#[derive(Debug)]
pub struct ValidatedArchive {
    path: PathBuf,
    docs: Mutex<Vec<Document>>,
}

impl ValidatedArchive {
    pub fn new(path: PathBuf, docs: Vec<Document>) -> Self {
        Self {
            path,
            docs: Mutex::new(docs),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, doc: Document, queue: &JobQueue) {
        let mut docs = self.docs.lock().await;
        docs.push(doc);
        queue.submit(&self.path, &*docs);
    }

    pub async fn len(&self) -> usize {
        self.docs.lock().await.len()
    }

    /// The archived document at `index`, counting only demo documents when
    /// `demo_only` is set.
    pub async fn view(&self, index: usize, demo_only: bool) -> Result<FinalDocumentView> {
        let docs = self.docs.lock().await;
        if docs.is_empty() {
            return Err(EngineError::NoWorkAvailable);
        }

        let selected: Vec<&Document> = docs.iter().filter(|d| !demo_only || d.is_demo()).collect();
        let doc = selected.get(index).ok_or(EngineError::IndexOutOfRange {
            index,
            len: selected.len(),
        })?;

        Ok(FinalDocumentView::new(doc, index, selected.len()))
    }

    /// Set the demo flag on an archived document.
    pub async fn set_add_demo(&self, id: i64, add_demo: bool, queue: &JobQueue) -> Result<Document> {
        self.update(id, queue, |doc| {
            doc.metadata.insert("add_demo".to_string(), Value::Bool(add_demo));
        })
        .await
    }

    /// Record another model's answer for an archived document under
    /// `answer_label[model_name]`.
    pub async fn add_model_content(
        &self,
        id: i64,
        model_name: &str,
        content: &str,
        queue: &JobQueue,
    ) -> Result<Document> {
        self.update(id, queue, |doc| {
            let labels = doc
                .fields
                .entry("answer_label")
                .or_insert_with(|| Value::Object(Map::new()));
            if !labels.is_object() {
                *labels = Value::Object(Map::new());
            }
            if let Some(labels) = labels.as_object_mut() {
                labels.insert(model_name.to_string(), Value::from(content));
            }
        })
        .await
    }

    async fn update(
        &self,
        id: i64,
        queue: &JobQueue,
        apply: impl FnOnce(&mut Document),
    ) -> Result<Document> {
        let mut docs = self.docs.lock().await;
        let doc = docs
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(EngineError::NotFound(id))?;

        apply(doc);
        let updated = doc.clone();
        queue.submit(&self.path, &*docs);

        Ok(updated)
    }
}

/// A free-form comment left by a reviewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackComment {
    #[serde(default)]
    pub tag_name: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    pub comment: String,
}

/// Append-only log of reviewer comments.
#[derive(Debug)]
pub struct FeedbackLog {
    path: PathBuf,
    entries: Mutex<Vec<FeedbackComment>>,
}

impl FeedbackLog {
    pub fn new(path: PathBuf, entries: Vec<FeedbackComment>) -> Self {
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Append a comment and return the number of comments recorded.
    pub async fn record(&self, comment: FeedbackComment, queue: &JobQueue) -> usize {
        let mut entries = self.entries.lock().await;
        entries.push(comment);
        queue.submit(&self.path, &*entries);
        entries.len()
    }
}
