//! Webhook alert adapter: POSTs `{"text": <message>}` to a chat webhook.

use crate::domain::error::CrosswatchError;
use crate::ports::alert_port::AlertPort;
use std::time::Duration;
use tracing::debug;

pub struct WebhookAlertAdapter {
    url: String,
    client: reqwest::blocking::Client,
}

impl WebhookAlertAdapter {
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self, CrosswatchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| CrosswatchError::AlertDelivery {
                reason: format!("cannot build HTTP client: {}", e),
            })?;
        Ok(Self {
            url: url.to_string(),
            client,
        })
    }
}

pub fn payload(message: &str) -> serde_json::Value {
    serde_json::json!({ "text": message })
}

impl AlertPort for WebhookAlertAdapter {
    fn send(&self, message: &str) -> Result<(), CrosswatchError> {
        let response = self
            .client
            .post(&self.url)
            .json(&payload(message))
            .send()
            .map_err(|e| CrosswatchError::AlertDelivery {
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(CrosswatchError::AlertDelivery {
                reason: format!("webhook returned {}", response.status()),
            });
        }

        debug!("webhook alert sent");
        Ok(())
    }
}
