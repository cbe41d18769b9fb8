// ABOUTME: Route definitions for the vaglio HTTP API.
// ABOUTME: Assembles all API routes into a single Axum Router with tracing, CORS, and a concurrency cap.

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::SharedState;

/// Build the complete Axum router with all routes and shared state.
pub fn create_router(state: SharedState) -> Router {
    let origins: Vec<HeaderValue> = state
        .allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);
    let max_concurrent = state.max_concurrent.max(1);

    Router::new()
        .route("/health", get(health))
        .route("/api/domande", get(api::blocks::checkout))
        .route("/api/domande/elimina", post(api::blocks::eliminate))
        .route("/api/domande/validate", post(api::blocks::complete))
        .route("/api/documenti/pending", get(api::documents::checkout))
        .route("/api/documenti/{id}/validate", post(api::documents::validate))
        .route("/api/documenti/final/{index}", get(api::documents::final_document))
        .route("/api/documenti/{id}/add_demo", post(api::documents::add_demo))
        .route(
            "/api/documenti/{id}/add_model_content",
            post(api::documents::add_model_content),
        )
        .route("/api/statistiche", get(api::progress::stats))
        .route("/api/feedback", post(api::progress::feedback))
        .layer(GlobalConcurrencyLimitLayer::new(max_concurrent))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler. Returns 200 OK with a simple JSON body.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::AppState;
    use axum::body::Body;
    use http::Request;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tower::ServiceExt;
    use vaglio_core::{
        Block, BlockFile, BlockPool, DocumentPool, EliminatedSet, EngineParts, FeedbackLog,
        JobQueue, LeasePolicy, ValidatedArchive, WorkflowEngine,
    };

    fn test_state() -> SharedState {
        let (queue, _rx) = JobQueue::channel();
        let parts = EngineParts {
            blocks: BlockPool::new(vec![BlockFile {
                path: PathBuf::from("blocks/a.json"),
                blocks: vec![Block::new(1), Block::new(2)],
            }]),
            documents: DocumentPool::new(PathBuf::from("docs.json"), Vec::new()),
            eliminated: EliminatedSet::new(PathBuf::from("eliminate.json"), [2]),
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

    #[tokio::test]
    async fn health_returns_ok() {
        let app = create_router(test_state());
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let json = json_body(resp).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn stats_reports_removed_blocks() {
        let app = create_router(test_state());
        let resp = app
            .oneshot(Request::get("/api/statistiche").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let json = json_body(resp).await;
        assert_eq!(json["blocks"]["pending"], 1);
        assert_eq!(json["blocks"]["removed"], 1);
        assert_eq!(json["docs"]["total"], 0);
        assert_eq!(json["docs"]["percent_validated"], 0.0);
    }

    #[tokio::test]
    async fn feedback_is_recorded() {
        let app = create_router(test_state());
        let body = serde_json::json!({"type": "bug", "comment": "answer cut short"});
        let resp = app
            .oneshot(
                Request::post("/api/feedback")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), 201);
        assert_eq!(json_body(resp).await["count"], 1);
    }

    #[tokio::test]
    async fn cors_allows_configured_origin() {
        let app = create_router(test_state());
        let resp = app
            .oneshot(
                Request::get("/health")
                    .header("origin", "http://localhost")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            resp.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost"
        );
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let app = create_router(test_state());
        let resp = app
            .oneshot(
                Request::post("/api/domande/elimina")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"eliminate\": \"all\"}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(resp.status().is_client_error());
    }
}
