//! Form-submission protocol: payload schemas, validation, escaping and
//! notification rendering shared by the handlers and the client.

pub mod escape;
pub mod render;
pub mod schema;

pub use escape::escape_html;
pub use render::Notification;
pub use schema::{CarpoolSubmission, FormKind, RsvpSubmission};

use serde::{Deserialize, Serialize};

/// Fixed rejection message for any payload missing a required field.
pub const MISSING_FIELDS_ERROR: &str = "Champs requis manquants.";

/// Client-side message shown when the consent checkbox is not affirmed.
pub const CONSENT_REQUIRED_ERROR: &str = "Veuillez accepter la mention RGPD.";

/// Tagged outcome of one submission, as seen by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionResult {
    /// The handler accepted the payload and dispatched the notification.
    Accepted { message: String },
    /// The caller's fault: missing fields, wrong method, consent not given.
    Rejected { error: String },
    /// A downstream failure: transport, network, malformed response.
    Failed { error: String },
}

impl SubmissionResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmissionResult::Accepted { .. })
    }
}
