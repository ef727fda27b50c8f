//! Submission client: one linear async operation per submit action, with
//! the consent gate and the double-submission guard applied before any
//! network traffic.

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::forms::{
    CarpoolSubmission, FormKind, RsvpSubmission, SubmissionResult, CONSENT_REQUIRED_ERROR,
};

use super::session::ClientSession;

/// Shown when the response body carries no `message`.
const GENERIC_SUCCESS: &str = "Merci ! Votre inscription a bien été envoyée.";
/// Shown when the response body carries no `error`.
const GENERIC_FAILURE: &str = "Erreur lors de l’envoi. Réessayez plus tard.";
/// A second submit while one is in flight is refused locally.
const IN_FLIGHT_ERROR: &str = "Envoi déjà en cours.";

pub struct SubmissionClient {
    http: reqwest::Client,
    session: Arc<ClientSession>,
    in_flight: AtomicBool,
}

impl SubmissionClient {
    pub fn new(session: Arc<ClientSession>) -> Self {
        Self {
            http: reqwest::Client::new(),
            session,
            in_flight: AtomicBool::new(false),
        }
    }

    /// The consent gate blocks without contacting the server.
    pub async fn submit_rsvp(&self, form: &RsvpSubmission) -> SubmissionResult {
        if !form.consent_given() {
            return SubmissionResult::Rejected {
                error: CONSENT_REQUIRED_ERROR.to_string(),
            };
        }
        self.submit(FormKind::Rsvp, form).await
    }

    pub async fn submit_carpool(&self, form: &CarpoolSubmission) -> SubmissionResult {
        self.submit(FormKind::Carpool, form).await
    }

    async fn submit<T: Serialize>(&self, kind: FormKind, form: &T) -> SubmissionResult {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return SubmissionResult::Rejected {
                error: IN_FLIGHT_ERROR.to_string(),
            };
        }

        let result = self.send_request(kind, form).await;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn send_request<T: Serialize>(&self, kind: FormKind, form: &T) -> SubmissionResult {
        let url = self.session.url(kind.action_path());
        let request = self.session.apply_auth(self.http.post(&url)).json(form);

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                let payload: Value = response.json().await.unwrap_or_else(|_| Value::Null);
                interpret_response(status, &payload)
            }
            Err(e) => SubmissionResult::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// Maps one HTTP response onto the tagged submission outcome.
fn interpret_response(status: StatusCode, payload: &Value) -> SubmissionResult {
    if status.is_success() {
        let message = payload
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(GENERIC_SUCCESS)
            .to_string();
        return SubmissionResult::Accepted { message };
    }

    let error = payload
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or(GENERIC_FAILURE)
        .to_string();

    if status.is_client_error() {
        SubmissionResult::Rejected { error }
    } else {
        SubmissionResult::Failed { error }
    }
}
