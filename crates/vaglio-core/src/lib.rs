// ABOUTME: Core library for vaglio: the in-memory review queue and its leasing protocol.
// ABOUTME: Defines work items, the eliminated set, leasing pools, the persistence job queue, and the engine.

pub mod archive;
pub mod eliminated;
pub mod engine;
pub mod error;
pub mod item;
pub mod job;
pub mod lease;
pub mod pool;

pub use archive::{FeedbackComment, FeedbackLog, FinalDocumentView, ValidatedArchive};
pub use eliminated::{EliminatedFile, EliminatedSet, EliminatedView};
pub use engine::{BlockCounts, DocumentStats, EngineParts, Stats, WorkflowEngine};
pub use error::{EngineError, Result};
pub use item::{Block, BlockStatus, Document, DocumentStatus, HumanValidation, RelatedQuestion};
pub use job::{Job, JobQueue, JobReceiver, PersistenceJob};
pub use lease::{LeasePolicy, epoch_seconds};
pub use pool::{BlockFile, BlockPool, DocumentPool};
