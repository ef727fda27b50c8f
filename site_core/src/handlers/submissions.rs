//! Mailer endpoints: one handler per form variant, same contract.
//!
//! POST only; validate presence, escape, render, dispatch exactly once,
//! answer `{"message"}` on success and `{"error"}` otherwise.

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use tracing::info;

use crate::error::{AppError, Result};
use crate::extractors::SubmissionJson;
use crate::forms::{CarpoolSubmission, FormKind, RsvpSubmission};
use crate::AppState;

pub async fn handle_rsvp(
    State(state): State<AppState>,
    SubmissionJson(form): SubmissionJson<RsvpSubmission>,
) -> Result<impl IntoResponse> {
    info!("POST {} - guest registration", FormKind::Rsvp.action_path());

    form.validate()?;

    state.mailer.send(form.render().into()).await?;

    Ok(Json(json!({
        "message": FormKind::Rsvp.confirmation(),
    })))
}

pub async fn handle_carpool(
    State(state): State<AppState>,
    SubmissionJson(form): SubmissionJson<CarpoolSubmission>,
) -> Result<impl IntoResponse> {
    info!("POST {} - carpool offer", FormKind::Carpool.action_path());

    form.validate()?;

    state.mailer.send(form.render().into()).await?;

    Ok(Json(json!({
        "message": FormKind::Carpool.confirmation(),
    })))
}

/// Routed for every non-POST method on the mailer endpoints, before any
/// body handling.
pub async fn handle_method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
