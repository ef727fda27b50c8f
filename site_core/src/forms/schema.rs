//! One named schema per form variant, each with its own required-field set.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

use super::MISSING_FIELDS_ERROR;

/// The enumerated set of forms the site serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Rsvp,
    Carpool,
}

impl FormKind {
    /// The endpoint the browser form declares as its action.
    pub const fn action_path(&self) -> &'static str {
        match self {
            FormKind::Rsvp => "/api/send",
            FormKind::Carpool => "/api/carpool",
        }
    }

    pub const fn required_fields(&self) -> &'static [&'static str] {
        match self {
            FormKind::Rsvp => &["firstName", "lastName", "email", "guests", "consent"],
            FormKind::Carpool => &["name", "city", "seats", "contact"],
        }
    }

    /// Confirmation text returned on successful dispatch.
    pub const fn confirmation(&self) -> &'static str {
        match self {
            FormKind::Rsvp => "Inscription envoyée. Merci !",
            FormKind::Carpool => "Proposition envoyée. Merci !",
        }
    }
}

/// Guest registration form. All values arrive as strings (browser FormData
/// serialization); absent and empty are equivalent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RsvpSubmission {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub guests: Option<String>,
    pub diet: Option<String>,
    pub message: Option<String>,
    pub consent: Option<String>,
}

/// Carpool offer form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CarpoolSubmission {
    pub name: Option<String>,
    pub city: Option<String>,
    pub seats: Option<String>,
    pub contact: Option<String>,
    pub message: Option<String>,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().map_or(false, |v| !v.trim().is_empty())
}

impl RsvpSubmission {
    pub fn kind(&self) -> FormKind {
        FormKind::Rsvp
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !present(&self.first_name) {
            missing.push("firstName");
        }
        if !present(&self.last_name) {
            missing.push("lastName");
        }
        if !present(&self.email) {
            missing.push("email");
        }
        if !present(&self.guests) {
            missing.push("guests");
        }
        if !self.consent_given() {
            missing.push("consent");
        }
        missing
    }

    /// Required-field presence check. Runs before any side effect.
    pub fn validate(&self) -> Result<()> {
        if self.missing_fields().is_empty() {
            Ok(())
        } else {
            Err(AppError::Rejected(MISSING_FIELDS_ERROR.to_string()))
        }
    }

    pub fn consent_given(&self) -> bool {
        present(&self.consent)
    }
}

impl CarpoolSubmission {
    pub fn kind(&self) -> FormKind {
        FormKind::Carpool
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !present(&self.name) {
            missing.push("name");
        }
        if !present(&self.city) {
            missing.push("city");
        }
        if !present(&self.seats) {
            missing.push("seats");
        }
        if !present(&self.contact) {
            missing.push("contact");
        }
        missing
    }

    pub fn validate(&self) -> Result<()> {
        if self.missing_fields().is_empty() {
            Ok(())
        } else {
            Err(AppError::Rejected(MISSING_FIELDS_ERROR.to_string()))
        }
    }
}
