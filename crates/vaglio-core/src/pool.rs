// ABOUTME: Block and document work pools, each guarded by its own lock.
// ABOUTME: Every mutation snapshots the affected file to the persistence queue before the lock is released.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::sync::Mutex;

use crate::eliminated::EliminatedView;
use crate::error::{EngineError, Result};
use crate::item::{Block, BlockStatus, Document, DocumentStatus, HumanValidation};
use crate::job::JobQueue;
use crate::lease::{self, Leasable, LeasePolicy};

/// Blocks loaded from one source file, written back to the same file.
#[derive(Debug, Clone)]
pub struct BlockFile {
    pub path: PathBuf,
    pub blocks: Vec<Block>,
}

/// Block counts by displayed status. Eliminated blocks count as `removed`
/// whatever their stored status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BlockCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub removed: usize,
}

/// All question blocks, grouped by the file they came from.
#[derive(Debug)]
pub struct BlockPool {
    files: Mutex<Vec<BlockFile>>,
}

impl BlockPool {
    pub fn new(files: Vec<BlockFile>) -> Self {
        Self {
            files: Mutex::new(files),
        }
    }

    /// Lease the first pending, non-eliminated block, scanning files in
    /// order. Expired leases in each scanned file are reclaimed first, and a
    /// file is persisted whenever the pass changed it.
    pub async fn checkout(
        &self,
        eliminated: &EliminatedView,
        policy: &LeasePolicy,
        now: f64,
        queue: &JobQueue,
    ) -> Option<Block> {
        let mut files = self.files.lock().await;

        for file in files.iter_mut() {
            let reclaimed = lease::sweep_expired(&mut file.blocks, policy, now);

            let leased = lease::first_available(&mut file.blocks, eliminated).map(|block| {
                block.retain_related(|id| eliminated.contains(id));
                block.acquire(now);
                block.clone()
            });

            if reclaimed > 0 || leased.is_some() {
                queue.submit(&file.path, &file.blocks);
            }

            if let Some(block) = leased {
                tracing::debug!(id = block.id_domanda, file = %file.path.display(), "block leased");
                return Some(block);
            }
        }

        None
    }

    /// Mark a leased block completed. Returns `Ok(false)` if it was already
    /// completed; a block that was never leased is rejected.
    pub async fn complete(&self, id: i64, queue: &JobQueue) -> Result<bool> {
        let mut files = self.files.lock().await;

        for file in files.iter_mut() {
            let Some(block) = file.blocks.iter_mut().find(|b| b.id_domanda == id) else {
                continue;
            };

            return match block.status {
                BlockStatus::InProgress => {
                    block.status = BlockStatus::Completed;
                    block.timestamp_in_progress = None;
                    queue.submit(&file.path, &file.blocks);
                    tracing::debug!(id, "block completed");
                    Ok(true)
                }
                BlockStatus::Completed => Ok(false),
                BlockStatus::Pending | BlockStatus::Other(_) => Err(EngineError::InvalidState {
                    id,
                    status: block.status.to_string(),
                    expected: "in_progress",
                }),
            };
        }

        Err(EngineError::NotFound(id))
    }

    pub async fn counts(&self, eliminated: &EliminatedView) -> BlockCounts {
        let files = self.files.lock().await;
        let mut counts = BlockCounts::default();

        for block in files.iter().flat_map(|f| f.blocks.iter()) {
            if eliminated.contains(block.id_domanda) {
                counts.removed += 1;
                continue;
            }
            match block.status {
                BlockStatus::Pending | BlockStatus::Other(_) => counts.pending += 1,
                BlockStatus::InProgress => counts.in_progress += 1,
                BlockStatus::Completed => counts.completed += 1,
            }
        }

        counts
    }

    /// A copy of every file's blocks.
    pub async fn snapshot(&self) -> Vec<BlockFile> {
        self.files.lock().await.clone()
    }
}

/// Validation progress over the document pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentCounts {
    /// Documents not stored as `removed`.
    pub total: usize,
    pub validated: usize,
}

/// All documents, kept in a single file.
#[derive(Debug)]
pub struct DocumentPool {
    path: PathBuf,
    docs: Mutex<Vec<Document>>,
}

impl DocumentPool {
    pub fn new(path: PathBuf, docs: Vec<Document>) -> Self {
        Self {
            path,
            docs: Mutex::new(docs),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lease the first queued, non-eliminated document after reclaiming
    /// expired leases.
    pub async fn checkout(
        &self,
        eliminated: &EliminatedView,
        policy: &LeasePolicy,
        now: f64,
        queue: &JobQueue,
    ) -> Option<Document> {
        let mut docs = self.docs.lock().await;

        let reclaimed = lease::sweep_expired(&mut docs, policy, now);
        let leased = lease::first_available(&mut docs, eliminated).map(|doc| {
            doc.acquire(now);
            doc.clone()
        });

        if reclaimed > 0 || leased.is_some() {
            queue.submit(&self.path, &*docs);
        }
        if let Some(doc) = &leased {
            tracing::debug!(id = doc.id, "document leased");
        }

        leased
    }

    /// Record a reviewer's validation on a leased document and return a copy
    /// of the updated document.
    pub async fn validate(
        &self,
        id: i64,
        validation: &HumanValidation,
        queue: &JobQueue,
    ) -> Result<Document> {
        let mut docs = self.docs.lock().await;

        let doc = docs
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(EngineError::NotFound(id))?;

        if doc.status != DocumentStatus::InProgress {
            return Err(EngineError::InvalidState {
                id,
                status: doc.status.to_string(),
                expected: "in_progress",
            });
        }

        validation.merge_into(&mut doc.metadata);
        doc.status = DocumentStatus::Validated;
        doc.timestamp_in_progress = None;
        let validated = doc.clone();

        queue.submit(&self.path, &*docs);
        tracing::debug!(id, "document validated");

        Ok(validated)
    }

    /// Move a pending document into the review queue. Returns whether a
    /// document changed.
    pub async fn enqueue(&self, id: i64, queue: &JobQueue) -> bool {
        let mut docs = self.docs.lock().await;

        let Some(doc) = docs
            .iter_mut()
            .find(|d| d.id == id && d.status == DocumentStatus::Pending)
        else {
            return false;
        };

        doc.status = DocumentStatus::InQueue;
        queue.submit(&self.path, &*docs);
        tracing::debug!(id, "document queued for review");
        true
    }

    pub async fn counts(&self) -> DocumentCounts {
        let docs = self.docs.lock().await;
        DocumentCounts {
            total: docs
                .iter()
                .filter(|d| d.status != DocumentStatus::Removed)
                .count(),
            validated: docs
                .iter()
                .filter(|d| d.status == DocumentStatus::Validated)
                .count(),
        }
    }

    /// A copy of every document.
    pub async fn snapshot(&self) -> Vec<Document> {
        self.docs.lock().await.clone()
    }
}
