pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::resume::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Form session
        .route("/resume", get(handlers::handle_get_resume))
        .route(
            "/resume/personal-info",
            patch(handlers::handle_update_personal_info),
        )
        .route("/resume/motivation", put(handlers::handle_set_motivation))
        .route("/resume/self-pr", put(handlers::handle_set_self_pr))
        .route("/resume/:list/entries", post(handlers::handle_add_entry))
        .route(
            "/resume/:list/entries/:id",
            patch(handlers::handle_update_entry).delete(handlers::handle_remove_entry),
        )
        // Persistence and export
        .route("/resume/commit", post(handlers::handle_commit))
        .route("/resume/export", post(handlers::handle_export))
        .with_state(state)
}
