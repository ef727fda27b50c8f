//! HTTP route tables: public mailer endpoints and the token-gated job API.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::AppState;

use super::{jobs, submissions};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route(
            "/api/send",
            post(submissions::handle_rsvp).fallback(submissions::handle_method_not_allowed),
        )
        .route(
            "/api/carpool",
            post(submissions::handle_carpool).fallback(submissions::handle_method_not_allowed),
        )
}

/// Job API routes; the caller layers the token gate on top.
pub fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/api/jobs", get(jobs::list_jobs).post(jobs::create_job))
        .route("/api/jobs/:id", get(jobs::get_job).delete(jobs::delete_job))
        .route("/api/jobs/:id/log", get(jobs::get_job_log))
        .route("/api/jobs/:id/open-output", post(jobs::open_job_output))
}

async fn handle_root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "app": state.app_name,
        "version": state.version,
        "endpoints": {
            "health": "/health",
            "rsvp": "/api/send",
            "carpool": "/api/carpool",
            "jobs": "/api/jobs"
        }
    }))
}

async fn handle_health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().timestamp(),
    }))
}
