//! SMS delivery client for out-of-band approval links.
//!
//! The approval token for a sent document travels to the counter-party over
//! SMS. Delivery is fire-and-forget from the caller's perspective: a failed
//! send is logged and never rolls back the state transition that triggered it.

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::SmsConfig;

/// SMS delivery errors.
#[derive(Debug, Error)]
pub enum SmsError {
    /// Gateway is not configured.
    #[error("SMS gateway is not configured")]
    NotConfigured,
    /// Request to the gateway failed.
    #[error("Failed to reach SMS gateway: {0}")]
    RequestError(String),
    /// Gateway rejected the message.
    #[error("SMS gateway rejected the message: status {0}")]
    GatewayError(u16),
}

#[derive(Debug, Serialize)]
struct GatewayPayload<'a> {
    sender: &'a str,
    to: &'a str,
    text: &'a str,
}

/// SMS service backed by a JSON-over-HTTP gateway.
#[derive(Debug, Clone)]
pub struct SmsService {
    config: SmsConfig,
    client: reqwest::Client,
}

impl SmsService {
    /// Creates a new SMS service.
    #[must_use]
    pub fn new(config: SmsConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Builds the approval link carried in the SMS body.
    #[must_use]
    pub fn approval_link(&self, token: &str) -> String {
        format!("{}/{token}", self.config.approval_base_url.trim_end_matches('/'))
    }

    /// Sends the approval link for a freshly sent document.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway is unconfigured, unreachable, or
    /// rejects the message.
    pub async fn send_approval_link(
        &self,
        phone: &str,
        document_number: &str,
        token: &str,
    ) -> Result<(), SmsError> {
        let link = self.approval_link(token);
        let text = format!(
            "Reconciliation document {document_number} is awaiting your review: {link}"
        );
        self.send(phone, &text).await
    }

    /// Sends a raw SMS message.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway is unconfigured, unreachable, or
    /// rejects the message.
    pub async fn send(&self, phone: &str, text: &str) -> Result<(), SmsError> {
        if self.config.gateway_url.is_empty() {
            return Err(SmsError::NotConfigured);
        }

        let payload = GatewayPayload {
            sender: &self.config.sender,
            to: phone,
            text,
        };

        let response = self
            .client
            .post(&self.config.gateway_url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SmsError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SmsError::GatewayError(response.status().as_u16()));
        }

        info!(to = %phone, "SMS dispatched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_link_strips_trailing_slash() {
        let service = SmsService::new(SmsConfig {
            approval_base_url: "https://app.example.com/approval/".to_string(),
            ..SmsConfig::default()
        });
        assert_eq!(
            service.approval_link("abc123"),
            "https://app.example.com/approval/abc123"
        );
    }

    #[tokio::test]
    async fn test_unconfigured_gateway_fails() {
        let service = SmsService::new(SmsConfig::default());
        let result = service.send("+15551234567", "hello").await;
        assert!(matches!(result, Err(SmsError::NotConfigured)));
    }
}
