use std::sync::Arc;

use crate::matching::orchestrator::MatchingService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Orchestrator wired with the model client, interpreter and stores.
    pub matching: Arc<MatchingService>,
    /// Request body cap for document uploads.
    pub max_upload_bytes: usize,
}
