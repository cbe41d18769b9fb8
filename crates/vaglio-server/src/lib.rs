// ABOUTME: HTTP server for vaglio, exposing the review queue to reviewer frontends.
// ABOUTME: Uses Axum with a shared WorkflowEngine; handlers only translate between JSON and engine calls.

pub mod api;
pub mod app_state;
pub mod config;
pub mod routes;

pub use app_state::{AppState, SharedState};
pub use config::{ConfigError, VaglioConfig};
pub use routes::create_router;
