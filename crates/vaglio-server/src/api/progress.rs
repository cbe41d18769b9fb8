// ABOUTME: Progress and feedback handlers: review statistics and reviewer comments.
// ABOUTME: Statistics are computed on demand from the engine's pools.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use vaglio_core::{FeedbackComment, Stats};

use crate::app_state::SharedState;

/// GET /api/statistiche - Review progress across documents and blocks.
pub async fn stats(State(state): State<SharedState>) -> Json<Stats> {
    Json(state.engine.stats().await)
}

/// POST /api/feedback - Record a reviewer comment.
pub async fn feedback(
    State(state): State<SharedState>,
    Json(comment): Json<FeedbackComment>,
) -> impl IntoResponse {
    let count = state.engine.record_feedback(comment).await;
    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "comment saved", "count": count })),
    )
}
