// ABOUTME: Startup recovery: rebuilds the engine's in-memory state from the data directory.
// ABOUTME: Missing or corrupt seed files degrade to empty collections instead of aborting startup.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use vaglio_core::{
    Block, BlockFile, BlockPool, Document, DocumentPool, EliminatedFile, EliminatedSet,
    EngineParts, FeedbackComment, FeedbackLog, JobQueue, LeasePolicy, ValidatedArchive,
    WorkflowEngine,
};

use crate::atomic::{StoreError, read_json};
use crate::layout::DataLayout;
use crate::worker::{WorkerReport, spawn_worker};

/// Source dataset shape: documents under a `qa_validation` key.
#[derive(Debug, Default, Deserialize)]
struct Dataset {
    #[serde(default)]
    qa_validation: Vec<Document>,
}

/// A running engine together with its persistence worker.
pub struct Recovered {
    pub engine: Arc<WorkflowEngine>,
    pub worker: JoinHandle<WorkerReport>,
}

/// Load every seed file under `layout`, assemble the engine, and start its
/// persistence worker. Must be called from within a tokio runtime.
///
/// Recovery sequence:
/// 1. Create the directory layout
/// 2. Load the eliminated ids
/// 3. Load the document working file, or derive it from the source dataset
/// 4. Load every block file
/// 5. Load the validated archive and feedback log
/// 6. Start the worker; derived or missing files are written through it
pub fn recover_engine(layout: &DataLayout, lease: LeasePolicy) -> Result<Recovered, StoreError> {
    layout.ensure_dirs()?;
    let (queue, jobs) = JobQueue::channel();

    let eliminated: EliminatedFile = load_or_default(&layout.eliminated_file());
    tracing::info!("loaded {} eliminated ids", eliminated.eliminate.len());

    let documents = recover_documents(layout, &queue);

    let mut block_files = Vec::new();
    for path in layout.block_files()? {
        let blocks: Vec<Block> = load_or_default(&path);
        tracing::info!("loaded {} blocks from {}", blocks.len(), path.display());
        block_files.push(BlockFile { path, blocks });
    }

    let validated_path = layout.validated_file();
    if !validated_path.exists() {
        queue.submit(&validated_path, &Vec::<Document>::new());
    }
    let validated: Vec<Document> = load_or_default(&validated_path);
    let comments: Vec<FeedbackComment> = load_or_default(&layout.comments_file());

    let parts = EngineParts {
        blocks: BlockPool::new(block_files),
        documents: DocumentPool::new(layout.documents_file(), documents),
        eliminated: EliminatedSet::new(layout.eliminated_file(), eliminated.eliminate),
        archive: ValidatedArchive::new(validated_path, validated),
        feedback: FeedbackLog::new(layout.comments_file(), comments),
    };

    let engine = Arc::new(WorkflowEngine::new(parts, queue, lease));
    let worker = spawn_worker(jobs);

    Ok(Recovered { engine, worker })
}

/// Prefer the working file; fall back to the source dataset only when the
/// working file is missing or empty, and persist the derived pool so the next
/// start uses the working file. A working file that exists but cannot be
/// parsed is left untouched on disk and the pool starts empty.
fn recover_documents(layout: &DataLayout, queue: &JobQueue) -> Vec<Document> {
    let working_path = layout.documents_file();
    match read_json::<Vec<Document>>(&working_path) {
        Ok(Some(working)) if !working.is_empty() => {
            tracing::info!("loaded {} documents from working file", working.len());
            return working;
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!(
                "document working file {} is unreadable, leaving it untouched: {}",
                working_path.display(),
                e
            );
            return Vec::new();
        }
    }

    let dataset: Dataset = load_or_default(&layout.dataset_file());
    tracing::info!(
        "derived {} documents from {}",
        dataset.qa_validation.len(),
        layout.dataset_file().display()
    );
    queue.submit(&working_path, &dataset.qa_validation);

    dataset.qa_validation
}

fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match read_json(path) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!("ignoring unreadable seed file {}: {}", path.display(), e);
            T::default()
        }
    }
}
