// ABOUTME: Shared application state for the vaglio HTTP server.
// ABOUTME: Holds the engine handle plus the request limits applied when building the router.

use std::sync::Arc;

use vaglio_core::WorkflowEngine;

use crate::config::VaglioConfig;

/// Shared application state accessible by all Axum handlers.
pub struct AppState {
    pub engine: Arc<WorkflowEngine>,
    pub max_concurrent: usize,
    pub allowed_origins: Vec<String>,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create an AppState with default request limits.
    pub fn new(engine: Arc<WorkflowEngine>) -> Self {
        Self::with_config(engine, &VaglioConfig::default())
    }

    pub fn with_config(engine: Arc<WorkflowEngine>, config: &VaglioConfig) -> Self {
        Self {
            engine,
            max_concurrent: config.max_concurrent,
            allowed_origins: config.allowed_origins.clone(),
        }
    }
}
