// ABOUTME: WorkflowEngine, the composition root the request layer calls into.
// ABOUTME: Orchestrates pools, the eliminated set, the archive, and the persistence queue without nesting locks.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::archive::{FeedbackComment, FeedbackLog, FinalDocumentView, ValidatedArchive};
use crate::eliminated::EliminatedSet;
use crate::error::{EngineError, Result};
use crate::item::{Block, Document, HumanValidation};
use crate::job::JobQueue;
use crate::lease::{LeasePolicy, epoch_seconds};
use crate::pool::{BlockPool, DocumentPool};

pub use crate::pool::BlockCounts;

/// Document validation progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DocumentStats {
    pub total: usize,
    pub validated: usize,
    pub percent_validated: f64,
}

/// Snapshot of review progress across both pools.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stats {
    pub docs: DocumentStats,
    pub blocks: BlockCounts,
    pub eliminated: usize,
    pub archived: usize,
}

/// The collections an engine is assembled from, usually produced by seed recovery.
#[derive(Debug)]
pub struct EngineParts {
    pub blocks: BlockPool,
    pub documents: DocumentPool,
    pub eliminated: EliminatedSet,
    pub archive: ValidatedArchive,
    pub feedback: FeedbackLog,
}

/// Hands out work to reviewers and records their results.
///
/// Each operation takes at most one lock at a time. The eliminated set is
/// read as a view before a pool lock is taken, so a concurrent elimination
/// may be missed by one pass and is picked up by the next.
#[derive(Debug)]
pub struct WorkflowEngine {
    blocks: BlockPool,
    documents: DocumentPool,
    eliminated: EliminatedSet,
    archive: ValidatedArchive,
    feedback: FeedbackLog,
    queue: JobQueue,
    lease: LeasePolicy,
}

impl WorkflowEngine {
    pub fn new(parts: EngineParts, queue: JobQueue, lease: LeasePolicy) -> Self {
        Self {
            blocks: parts.blocks,
            documents: parts.documents,
            eliminated: parts.eliminated,
            archive: parts.archive,
            feedback: parts.feedback,
            queue,
            lease,
        }
    }

    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }

    pub fn lease_policy(&self) -> LeasePolicy {
        self.lease
    }

    pub fn blocks(&self) -> &BlockPool {
        &self.blocks
    }

    pub fn documents(&self) -> &DocumentPool {
        &self.documents
    }

    pub fn eliminated(&self) -> &EliminatedSet {
        &self.eliminated
    }

    pub async fn checkout_block(&self) -> Result<Block> {
        self.checkout_block_at(Utc::now()).await
    }

    /// Checkout a block as if the current time were `now`.
    pub async fn checkout_block_at(&self, now: DateTime<Utc>) -> Result<Block> {
        let eliminated = self.eliminated.view();
        self.blocks
            .checkout(&eliminated, &self.lease, epoch_seconds(now), &self.queue)
            .await
            .ok_or(EngineError::NoWorkAvailable)
    }

    pub async fn checkout_document(&self) -> Result<Document> {
        self.checkout_document_at(Utc::now()).await
    }

    /// Checkout a document as if the current time were `now`.
    pub async fn checkout_document_at(&self, now: DateTime<Utc>) -> Result<Document> {
        let eliminated = self.eliminated.view();
        self.documents
            .checkout(&eliminated, &self.lease, epoch_seconds(now), &self.queue)
            .await
            .ok_or(EngineError::NoWorkAvailable)
    }

    /// Complete a leased block. When the block changes, the document with the
    /// same id moves from `pending` into the review queue.
    pub async fn complete_block(&self, id: i64) -> Result<bool> {
        let completed = self.blocks.complete(id, &self.queue).await?;
        if completed {
            self.documents.enqueue(id, &self.queue).await;
        }
        Ok(completed)
    }

    /// Validate a leased document and archive the result.
    pub async fn validate_document(&self, id: i64, validation: &HumanValidation) -> Result<Document> {
        let doc = self.documents.validate(id, validation, &self.queue).await?;
        self.archive.append(doc.clone(), &self.queue).await;
        Ok(doc)
    }

    /// Exclude `ids` from all future assignment. Returns every eliminated id,
    /// ascending.
    pub fn eliminate(&self, ids: impl IntoIterator<Item = i64>) -> Vec<i64> {
        self.eliminated.add_all(ids, &self.queue).to_vec()
    }

    pub async fn stats(&self) -> Stats {
        let eliminated = self.eliminated.view();
        let docs = self.documents.counts().await;
        let blocks = self.blocks.counts(&eliminated).await;
        let archived = self.archive.len().await;

        let percent_validated = if docs.total == 0 {
            0.0
        } else {
            let done = (docs.validated + eliminated.len()) as f64;
            (done / docs.total as f64 * 100.0).min(100.0)
        };

        Stats {
            docs: DocumentStats {
                total: docs.total,
                validated: docs.validated,
                percent_validated,
            },
            blocks,
            eliminated: eliminated.len(),
            archived,
        }
    }

    pub async fn final_document(&self, index: usize, demo_only: bool) -> Result<FinalDocumentView> {
        self.archive.view(index, demo_only).await
    }

    pub async fn set_add_demo(&self, id: i64, add_demo: bool) -> Result<Document> {
        self.archive.set_add_demo(id, add_demo, &self.queue).await
    }

    pub async fn add_model_content(&self, id: i64, model_name: &str, content: &str) -> Result<Document> {
        self.archive
            .add_model_content(id, model_name, content, &self.queue)
            .await
    }

    pub async fn record_feedback(&self, comment: FeedbackComment) -> usize {
        self.feedback.record(comment, &self.queue).await
    }
}
