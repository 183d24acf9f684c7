pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/model-status", get(handlers::handle_model_status))
        .route(
            "/match-resume/:posting_id",
            post(handlers::handle_match_resume),
        )
        .route(
            "/extract-work-experience",
            post(handlers::handle_extract_work_experience),
        )
        .route("/resume-advice", post(handlers::handle_resume_advice))
        .route("/resume", post(handlers::handle_upload_resume))
        .route(
            "/work-experience",
            get(handlers::handle_list_work_experience).post(handlers::handle_add_work_experience),
        )
        .layer(upload_limit)
        .with_state(state)
}
