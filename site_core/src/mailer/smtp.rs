use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::config::SmtpConfig;
use crate::error::{AppError, Result};

use super::{Mailer, OutgoingMail};

/// SMTP-backed notification channel. `secure` selects implicit TLS; the
/// default is STARTTLS on port 587.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(config: &SmtpConfig) -> Result<Self> {
        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| AppError::Server(e.to_string()))?;

        let mut builder = builder.port(config.port);
        if !config.user.is_empty() {
            builder = builder
                .credentials(Credentials::new(config.user.clone(), config.pass.clone()));
        }

        let from = parse_mailbox(config.sender())?;
        let to = parse_mailbox(&config.to)?;

        info!("SMTP transport configured for {}:{}", config.host, config.port);

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse::<Mailbox>()
        .map_err(|e| AppError::Server(format!("adresse invalide '{}': {}", address, e)))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(mail.html_body)
            .map_err(|e| AppError::Server(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Server(e.to_string()))?;

        info!("Notification dispatched: {}", mail.subject);
        Ok(())
    }
}
