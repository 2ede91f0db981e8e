pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::tailoring::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Tailoring workflow
        .route(
            "/api/v1/tailoring/sessions",
            post(handlers::handle_create_session),
        )
        .route(
            "/api/v1/tailoring/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/tailoring/sessions/:id/apply",
            post(handlers::handle_apply),
        )
        .route(
            "/api/v1/tailoring/sessions/:id/dismiss",
            post(handlers::handle_dismiss),
        )
        .route(
            "/api/v1/tailoring/sessions/:id/complete",
            post(handlers::handle_complete),
        )
        .route(
            "/api/v1/tailoring/sessions/:id/reopen",
            post(handlers::handle_reopen),
        )
        .with_state(state)
}
