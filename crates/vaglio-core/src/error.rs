// ABOUTME: Error taxonomy for engine operations surfaced synchronously to callers.
// ABOUTME: Persistence failures are not represented here; they are logged by the write worker.

use thiserror::Error;

/// Errors returned by the workflow engine. None of these are fatal; the
/// request layer translates each into a user-facing response.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no work available")]
    NoWorkAvailable,

    #[error("work item not found: {0}")]
    NotFound(i64),

    #[error("work item {id} is {status}, expected {expected}")]
    InvalidState {
        id: i64,
        status: String,
        expected: &'static str,
    },

    #[error("index {index} out of range for {len} documents")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, EngineError>;
