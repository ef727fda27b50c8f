//! Notification rendering: each form variant owns its subject line and
//! HTML template. Every user-supplied value goes through `escape_html`.

use super::escape::escape_html;
use super::schema::{CarpoolSubmission, RsvpSubmission};

const RSVP_SUBJECT: &str = "Inscription — Anniversaire de Nicolas";
const CARPOOL_SUBJECT: &str = "Covoiturage — Anniversaire de Nicolas";

/// Rendered notification content, ready for the mailer.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub subject: String,
    pub html: String,
}

fn optional(value: &Option<String>) -> String {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => escape_html(v),
        _ => "—".to_string(),
    }
}

fn required(value: &Option<String>) -> String {
    escape_html(value.as_deref().unwrap_or_default())
}

impl RsvpSubmission {
    pub fn render(&self) -> Notification {
        let html = format!(
            concat!(
                "<h2>Nouvelle inscription — Anniversaire de Nicolas</h2>\n",
                "<ul>\n",
                "<li><b>Nom:</b> {first} {last}</li>\n",
                "<li><b>Email:</b> {email}</li>\n",
                "<li><b>Téléphone:</b> {phone}</li>\n",
                "<li><b>Invités:</b> {guests}</li>\n",
                "<li><b>Régime:</b> {diet}</li>\n",
                "<li><b>Message:</b> {message}</li>\n",
                "</ul>\n",
                "<p style=\"font-size:12px;color:#666\">Consentement RGPD reçu: {consent}</p>\n",
            ),
            first = required(&self.first_name),
            last = required(&self.last_name),
            email = required(&self.email),
            phone = optional(&self.phone),
            guests = required(&self.guests),
            diet = optional(&self.diet),
            message = optional(&self.message),
            consent = if self.consent_given() { "oui" } else { "non" },
        );

        Notification {
            subject: RSVP_SUBJECT.to_string(),
            html,
        }
    }
}

impl CarpoolSubmission {
    pub fn render(&self) -> Notification {
        let html = format!(
            concat!(
                "<h2>Proposition de covoiturage</h2>\n",
                "<ul>\n",
                "<li><b>Nom:</b> {name}</li>\n",
                "<li><b>Ville de départ:</b> {city}</li>\n",
                "<li><b>Places disponibles:</b> {seats}</li>\n",
                "<li><b>Contact:</b> {contact}</li>\n",
                "<li><b>Message:</b> {message}</li>\n",
                "</ul>\n",
            ),
            name = required(&self.name),
            city = required(&self.city),
            seats = required(&self.seats),
            contact = required(&self.contact),
            message = optional(&self.message),
        );

        Notification {
            subject: CARPOOL_SUBJECT.to_string(),
            html,
        }
    }
}
