// ABOUTME: Question block handlers: lease a block, eliminate questions, complete a block.
// ABOUTME: Each handler is a single engine call plus the error-to-status mapping.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::api::error_response;
use crate::app_state::SharedState;

/// Request body for eliminating questions.
#[derive(Debug, Deserialize)]
pub struct EliminateRequest {
    pub eliminate: Vec<i64>,
}

/// Request body for completing a block.
#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub id_domanda: i64,
}

/// GET /api/domande - Lease the next available question block.
pub async fn checkout(State(state): State<SharedState>) -> impl IntoResponse {
    match state.engine.checkout_block().await {
        Ok(block) => Json(block).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST /api/domande/elimina - Exclude question ids from future assignment.
pub async fn eliminate(
    State(state): State<SharedState>,
    Json(req): Json<EliminateRequest>,
) -> impl IntoResponse {
    tracing::info!("eliminating {} question ids", req.eliminate.len());
    let eliminate = state.engine.eliminate(req.eliminate);
    (
        StatusCode::OK,
        Json(serde_json::json!({ "message": "questions eliminated", "eliminate": eliminate })),
    )
}

/// POST /api/domande/validate - Complete a leased block.
pub async fn complete(
    State(state): State<SharedState>,
    Json(req): Json<CompleteRequest>,
) -> impl IntoResponse {
    match state.engine.complete_block(req.id_domanda).await {
        Ok(completed) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "block validated", "completed": completed })),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}
