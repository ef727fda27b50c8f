//! Outbound notification channel. The trait seam keeps handlers independent
//! of the transport so tests and credential-less development can run on the
//! in-memory implementation.

pub mod memory;
pub mod smtp;

pub use memory::MemoryMailer;
pub use smtp::SmtpMailer;

use async_trait::async_trait;

use crate::error::Result;
use crate::forms::Notification;

/// One outbound email, already rendered and escaped.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub subject: String,
    pub html_body: String,
}

impl From<Notification> for OutgoingMail {
    fn from(notification: Notification) -> Self {
        Self {
            subject: notification.subject,
            html_body: notification.html,
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Dispatches exactly one notification. No retry on failure; the error
    /// is surfaced to the caller, who may resubmit.
    async fn send(&self, mail: OutgoingMail) -> Result<()>;
}
