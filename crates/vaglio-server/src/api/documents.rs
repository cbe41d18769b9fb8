// ABOUTME: Document handlers: lease and validate documents, browse and annotate the validated archive.
// ABOUTME: Path ids that fail to parse are rejected by Axum before reaching the engine.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use vaglio_core::HumanValidation;

use crate::api::error_response;
use crate::app_state::SharedState;

/// Query parameters for browsing the validated archive.
#[derive(Debug, Default, Deserialize)]
pub struct FinalQuery {
    #[serde(default)]
    pub demo_only: bool,
}

/// Request body for toggling the demo flag.
#[derive(Debug, Deserialize)]
pub struct AddDemoRequest {
    pub add_demo: bool,
}

/// Request body for recording another model's answer.
#[derive(Debug, Deserialize)]
pub struct ModelContentRequest {
    pub model_name: String,
    pub model_content: String,
}

/// GET /api/documenti/pending - Lease the next queued document.
pub async fn checkout(State(state): State<SharedState>) -> impl IntoResponse {
    match state.engine.checkout_document().await {
        Ok(doc) => Json(doc).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST /api/documenti/{id}/validate - Submit the reviewer's validation.
pub async fn validate(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(validation): Json<HumanValidation>,
) -> impl IntoResponse {
    match state.engine.validate_document(id, &validation).await {
        Ok(doc) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "document validated", "document": doc })),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET /api/documenti/final/{index} - Read an archived document by position.
pub async fn final_document(
    State(state): State<SharedState>,
    Path(index): Path<usize>,
    Query(query): Query<FinalQuery>,
) -> impl IntoResponse {
    match state.engine.final_document(index, query.demo_only).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST /api/documenti/{id}/add_demo - Flag or unflag an archived document for demos.
pub async fn add_demo(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<AddDemoRequest>,
) -> impl IntoResponse {
    match state.engine.set_add_demo(id, req.add_demo).await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": format!("add_demo set to {}", req.add_demo) })),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST /api/documenti/{id}/add_model_content - Attach another model's answer.
pub async fn add_model_content(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<ModelContentRequest>,
) -> impl IntoResponse {
    match state
        .engine
        .add_model_content(id, &req.model_name, &req.model_content)
        .await
    {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "model content added" })),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use crate::app_state::{AppState, SharedState};
    use crate::routes::create_router;
    use axum::body::Body;
    use axum::http::StatusCode;
    use http::Request;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tower::ServiceExt;
    use vaglio_core::{
        BlockPool, Document, DocumentPool, DocumentStatus, EliminatedSet, EngineParts,
        FeedbackLog, JobQueue, LeasePolicy, ValidatedArchive, WorkflowEngine,
    };

    fn test_state(docs: Vec<Document>) -> SharedState {
        let (queue, _rx) = JobQueue::channel();
        let parts = EngineParts {
            blocks: BlockPool::new(Vec::new()),
            documents: DocumentPool::new(PathBuf::from("docs.json"), docs),
            eliminated: EliminatedSet::new(PathBuf::from("eliminate.json"), []),
            archive: ValidatedArchive::new(PathBuf::from("final.json"), Vec::new()),
            feedback: FeedbackLog::new(PathBuf::from("comments.json"), Vec::new()),
        };
        let engine = WorkflowEngine::new(parts, queue, LeasePolicy::default());
        Arc::new(AppState::new(Arc::new(engine)))
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    fn validation_body(add_demo: bool) -> serde_json::Value {
        serde_json::json!({
            "human_question_validation": {"grammar": "ok"},
            "human_answer_validation": {"correct": "yes"},
            "document_question_rating": 5,
            "document_answer_rating": 4,
            "add_demo": add_demo
        })
    }

    #[tokio::test]
    async fn validate_requires_lease() {
        let state = test_state(vec![Document::new(1, DocumentStatus::InQueue)]);

        let resp = create_router(Arc::clone(&state))
            .oneshot(post_json("/api/documenti/1/validate", validation_body(false)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = create_router(Arc::clone(&state))
            .oneshot(post_json("/api/documenti/2/validate", validation_body(false)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn lease_validate_and_browse_archive() {
        let state = test_state(vec![
            Document::new(1, DocumentStatus::InQueue),
            Document::new(2, DocumentStatus::InQueue),
        ]);

        for (id, demo) in [(1, false), (2, true)] {
            let resp = create_router(Arc::clone(&state))
                .oneshot(Request::get("/api/documenti/pending").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(json_body(resp).await["id"], id);

            let resp = create_router(Arc::clone(&state))
                .oneshot(post_json(
                    &format!("/api/documenti/{}/validate", id),
                    validation_body(demo),
                ))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let resp = create_router(Arc::clone(&state))
            .oneshot(
                Request::get("/api/documenti/final/0?demo_only=true")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["id"], 2);
        assert_eq!(json["total"], 1);
        assert_eq!(json["metadata"]["human_answer_validation"]["correct"], "yes");

        let resp = create_router(Arc::clone(&state))
            .oneshot(Request::get("/api/documenti/final/5").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn annotate_archived_document() {
        let state = test_state(vec![Document::new(1, DocumentStatus::InQueue)]);
        state.engine.checkout_document().await.unwrap();
        state
            .engine
            .validate_document(1, &serde_json::from_value(validation_body(false)).unwrap())
            .await
            .unwrap();

        let resp = create_router(Arc::clone(&state))
            .oneshot(post_json(
                "/api/documenti/1/add_demo",
                serde_json::json!({"add_demo": true}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = create_router(Arc::clone(&state))
            .oneshot(post_json(
                "/api/documenti/1/add_model_content",
                serde_json::json!({"model_name": "llama", "model_content": "Roma"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let view = state.engine.final_document(0, true).await.unwrap();
        assert_eq!(view.answer_label["llama"], "Roma");

        let resp = create_router(state)
            .oneshot(post_json(
                "/api/documenti/9/add_demo",
                serde_json::json!({"add_demo": true}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_archive_is_404() {
        let state = test_state(Vec::new());
        let resp = create_router(state)
            .oneshot(Request::get("/api/documenti/final/0").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
