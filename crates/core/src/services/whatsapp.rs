//! WhatsApp text transport.
//!
//! Used for phone verification codes and alert notifications when the
//! recipient left a phone number. Numbers are normalized to digits-only
//! international form before hitting the API; the messaging provider rejects
//! local formats.

use async_trait::async_trait;
use proplet_common::{AppError, AppResult, config::WhatsAppConfig};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Sends WhatsApp text messages.
#[async_trait]
pub trait WhatsAppSender: Send + Sync {
    /// Send a text message to a phone number (any reasonable format).
    async fn send_text(&self, phone: &str, body: &str) -> AppResult<()>;
}

/// Normalize a phone number to digits-only international form.
///
/// A leading `0` is replaced with the configured country code; a leading `+`
/// or `00` is stripped. Returns `None` when too few digits remain to be a
/// dialable number.
#[must_use]
pub fn normalize_phone(raw: &str, country_code: &str) -> Option<String> {
    let stripped = raw.trim().trim_start_matches('+');
    let digits: String = stripped.chars().filter(char::is_ascii_digit).collect();

    let normalized = if let Some(rest) = digits.strip_prefix("00") {
        rest.to_string()
    } else if let Some(rest) = digits.strip_prefix('0') {
        format!("{country_code}{rest}")
    } else {
        digits
    };

    // Shortest real E.164 numbers are 8 digits with the country code.
    if normalized.len() < 8 {
        return None;
    }

    Some(normalized)
}

/// REST client for the messaging API.
pub struct RestWhatsAppClient {
    client: reqwest::Client,
    config: WhatsAppConfig,
}

impl RestWhatsAppClient {
    /// Create a new client from configuration.
    pub fn new(config: WhatsAppConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl WhatsAppSender for RestWhatsAppClient {
    async fn send_text(&self, phone: &str, body: &str) -> AppResult<()> {
        let to = normalize_phone(phone, &self.config.default_country_code)
            .ok_or_else(|| AppError::Validation(format!("Unusable phone number: {phone}")))?;

        let payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": body },
        });

        let response = self
            .client
            .post(format!(
                "{}/messages",
                self.config.base_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.config.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("WhatsApp send failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Provider(format!(
                "WhatsApp send returned {}",
                response.status()
            )));
        }

        debug!(to = %to, "Sent WhatsApp message");
        Ok(())
    }
}

/// Sender used when no transport is configured.
pub struct DisabledWhatsAppSender;

#[async_trait]
impl WhatsAppSender for DisabledWhatsAppSender {
    async fn send_text(&self, phone: &str, _body: &str) -> AppResult<()> {
        info!(phone = %phone, "WhatsApp delivery disabled; dropping message");
        Ok(())
    }
}

/// Build the configured sender, falling back to the disabled one.
pub fn whatsapp_sender_from_config(
    config: Option<&WhatsAppConfig>,
) -> AppResult<Arc<dyn WhatsAppSender>> {
    match config {
        Some(config) => Ok(Arc::new(RestWhatsAppClient::new(config.clone())?)),
        None => Ok(Arc::new(DisabledWhatsAppSender)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_local_number() {
        assert_eq!(
            normalize_phone("08012345678", "234").unwrap(),
            "2348012345678"
        );
    }

    #[test]
    fn test_normalize_international_forms() {
        assert_eq!(
            normalize_phone("+234 801 234 5678", "234").unwrap(),
            "2348012345678"
        );
        assert_eq!(
            normalize_phone("002348012345678", "234").unwrap(),
            "2348012345678"
        );
        assert_eq!(
            normalize_phone("234-801-234-5678", "234").unwrap(),
            "2348012345678"
        );
    }

    #[test]
    fn test_normalize_rejects_junk() {
        assert!(normalize_phone("call me", "234").is_none());
        assert!(normalize_phone("0801", "234").is_none());
    }
}
