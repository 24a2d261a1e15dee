//! Outbound email.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use proplet_common::{AppError, AppResult, config::EmailConfig};
use std::sync::Arc;
use tracing::{debug, info};

/// Sends plain-text email.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send a message to a single recipient.
    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()>;
}

/// SMTP-backed sender.
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpEmailSender {
    /// Build a sender from SMTP configuration.
    pub fn new(config: &EmailConfig) -> AppResult<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::Config(format!("Invalid SMTP host: {e}")))?
            .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: format!("{} <{}>", config.from_name, config.from_address),
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| AppError::Config(format!("Invalid from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| AppError::Validation(format!("Invalid recipient address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to build message: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Provider(format!("SMTP send failed: {e}")))?;

        debug!(to = %to, subject = %subject, "Sent email");
        Ok(())
    }
}

/// Sender used when no SMTP configuration is present. Logs instead of
/// delivering, so local development works without a mail server.
pub struct DisabledEmailSender;

#[async_trait]
impl EmailSender for DisabledEmailSender {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> AppResult<()> {
        info!(to = %to, subject = %subject, "Email delivery disabled; dropping message");
        Ok(())
    }
}

/// Build the configured sender, falling back to the disabled one.
pub fn email_sender_from_config(config: Option<&EmailConfig>) -> AppResult<Arc<dyn EmailSender>> {
    match config {
        Some(config) => Ok(Arc::new(SmtpEmailSender::new(config)?)),
        None => Ok(Arc::new(DisabledEmailSender)),
    }
}
