// ABOUTME: API module containing all HTTP handler functions for the vaglio REST API.
// ABOUTME: Organized into question blocks, documents, and progress/feedback endpoints.

pub mod blocks;
pub mod documents;
pub mod progress;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use vaglio_core::EngineError;

/// Map an engine error to its HTTP status with a JSON error body.
pub fn error_response(err: &EngineError) -> Response {
    let status = match err {
        EngineError::NoWorkAvailable | EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::InvalidState { .. } | EngineError::IndexOutOfRange { .. } => {
            StatusCode::BAD_REQUEST
        }
    };
    tracing::debug!(%status, "request rejected: {}", err);

    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}
