//! Payment provider client.
//!
//! The provider is behind a trait so services can be tested against a stub
//! without network access. The REST client targets a Paystack-style API:
//! initialize a transaction, redirect the payer to the returned checkout
//! URL, then verify the transaction by reference after the redirect back.

use async_trait::async_trait;
use proplet_common::{AppError, AppResult, config::PaymentConfig};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// A checkout session created at the provider.
#[derive(Debug, Clone)]
pub struct ChargeSession {
    /// Hosted checkout page to send the payer to.
    pub authorization_url: String,
    /// Our reference, echoed back by the provider.
    pub reference: String,
}

/// Outcome of a charge verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeStatus {
    /// The provider confirms the charge completed.
    Succeeded,
    /// The charge exists but has not completed (abandoned, processing).
    Pending,
    /// The charge failed at the provider.
    Failed,
}

/// Payment provider operations.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Initialize a charge and return the checkout session.
    async fn initialize_charge(
        &self,
        reference: &str,
        amount: i64,
        email: &str,
    ) -> AppResult<ChargeSession>;

    /// Ask the provider for the current status of a charge.
    async fn confirm_charge(&self, reference: &str) -> AppResult<ChargeStatus>;
}

#[derive(Debug, Deserialize)]
struct ProviderEnvelope<T> {
    status: bool,
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    reference: String,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
}

/// REST client for the payment provider.
pub struct RestPaymentClient {
    client: reqwest::Client,
    config: PaymentConfig,
}

impl RestPaymentClient {
    /// Create a new client from configuration.
    pub fn new(config: PaymentConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl PaymentProvider for RestPaymentClient {
    async fn initialize_charge(
        &self,
        reference: &str,
        amount: i64,
        email: &str,
    ) -> AppResult<ChargeSession> {
        let body = json!({
            "reference": reference,
            "amount": amount,
            "currency": self.config.currency,
            "email": email,
            "callback_url": self.config.return_url,
        });

        let response = self
            .client
            .post(self.endpoint("transaction/initialize"))
            .bearer_auth(&self.config.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Charge initialization failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Provider(format!(
                "Charge initialization returned {}",
                response.status()
            )));
        }

        let envelope: ProviderEnvelope<InitializeData> = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Malformed initialization response: {e}")))?;

        match envelope.data {
            Some(data) if envelope.status => {
                debug!(reference = %data.reference, "Initialized charge");
                Ok(ChargeSession {
                    authorization_url: data.authorization_url,
                    reference: data.reference,
                })
            }
            _ => Err(AppError::Provider(
                envelope
                    .message
                    .unwrap_or_else(|| "Charge initialization rejected".to_string()),
            )),
        }
    }

    async fn confirm_charge(&self, reference: &str) -> AppResult<ChargeStatus> {
        let response = self
            .client
            .get(self.endpoint(&format!("transaction/verify/{reference}")))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Charge verification failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Provider(format!(
                "Charge verification returned {}",
                response.status()
            )));
        }

        let envelope: ProviderEnvelope<VerifyData> = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Malformed verification response: {e}")))?;

        let Some(data) = envelope.data else {
            return Err(AppError::Provider(
                envelope
                    .message
                    .unwrap_or_else(|| "Unknown charge reference".to_string()),
            ));
        };

        Ok(match data.status.as_str() {
            "success" => ChargeStatus::Succeeded,
            "failed" => ChargeStatus::Failed,
            _ => ChargeStatus::Pending,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_cleanly() {
        let config = PaymentConfig {
            base_url: "https://api.paystack.co/".to_string(),
            secret_key: "sk_test".to_string(),
            unlock_amount: 5_000,
            currency: "NGN".to_string(),
            return_url: "https://proplet.example/unlocks/verify".to_string(),
            timeout_secs: 15,
        };

        let client = RestPaymentClient::new(config).unwrap();
        assert_eq!(
            client.endpoint("transaction/verify/plt_abc"),
            "https://api.paystack.co/transaction/verify/plt_abc"
        );
    }

    #[test]
    fn test_verify_status_parsing() {
        let envelope: ProviderEnvelope<VerifyData> = serde_json::from_value(json!({
            "status": true,
            "message": "Verification successful",
            "data": { "status": "abandoned" }
        }))
        .unwrap();

        assert!(envelope.status);
        assert_eq!(envelope.data.unwrap().status, "abandoned");
    }
}
