use std::sync::Arc;

use crate::config::ResponseShape;
use crate::llm_client::LlmClient;
use crate::posts::store::PostStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Built once in `main`; tests build their own with a memory store and a mock AI service.
#[derive(Clone)]
pub struct AppState {
    pub llm: LlmClient,
    /// Pluggable post store. Postgres in production, in-memory for local runs and tests.
    pub store: Arc<dyn PostStore>,
    pub response_shape: ResponseShape,
}
