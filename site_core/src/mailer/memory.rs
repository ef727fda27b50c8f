use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, Result};

use super::{Mailer, OutgoingMail};

/// In-memory notification channel. Records every dispatch so tests can
/// assert on side effects; also the startup fallback when no SMTP host is
/// configured. An injected failure message makes `send` fail like a real
/// transport would.
#[derive(Clone, Default)]
pub struct MemoryMailer {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
    fail_with: Arc<Mutex<Option<String>>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every `send` fails with the given transport error.
    pub fn failing(message: &str) -> Self {
        let mailer = Self::default();
        *mailer.fail_with.lock() = Some(message.to_string());
        mailer
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        if let Some(message) = self.fail_with.lock().clone() {
            return Err(AppError::Server(message));
        }

        info!("Notification recorded (no SMTP transport): {}", mail.subject);
        self.sent.lock().push(mail);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_dispatches() {
        let mailer = MemoryMailer::new();
        mailer
            .send(OutgoingMail {
                subject: "s".to_string(),
                html_body: "<p>b</p>".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(mailer.sent_count(), 1);
        assert_eq!(mailer.sent()[0].subject, "s");
    }

    #[tokio::test]
    async fn test_failing_mailer_surfaces_transport_error() {
        let mailer = MemoryMailer::failing("connexion refusée");
        let err = mailer
            .send(OutgoingMail {
                subject: "s".to_string(),
                html_body: String::new(),
            })
            .await
            .unwrap_err();

        assert!(err.to_string().contains("connexion refusée"));
        assert_eq!(mailer.sent_count(), 0);
    }
}
