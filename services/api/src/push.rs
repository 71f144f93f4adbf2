//! Push gateway client
//!
//! Delivery is attempted once per device handle and never retried here;
//! callers treat every failure as log-and-continue. With no gateway URL
//! configured the client silently drops messages, which keeps local
//! development and tests off the network.

use anyhow::Result;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

/// Push gateway configuration
#[derive(Debug, Clone)]
pub struct PushConfig {
    /// Gateway endpoint; unset disables delivery
    pub gateway_url: Option<String>,
    /// Bearer key for the gateway, if it requires one
    pub api_key: Option<String>,
}

impl PushConfig {
    /// Create a new PushConfig from environment variables
    ///
    /// # Environment Variables
    /// - `PUSH_GATEWAY_URL`: gateway endpoint (unset disables push delivery)
    /// - `PUSH_GATEWAY_API_KEY`: optional bearer key for the gateway
    pub fn from_env() -> Self {
        PushConfig {
            gateway_url: std::env::var("PUSH_GATEWAY_URL").ok(),
            api_key: std::env::var("PUSH_GATEWAY_API_KEY").ok(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PushMessage {
    to: String,
    title: String,
    body: String,
    data: serde_json::Value,
}

/// Push gateway client
#[derive(Clone)]
pub struct PushClient {
    client: Client,
    config: PushConfig,
}

impl PushClient {
    pub fn new(config: PushConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Send one push message to a device handle
    pub async fn send(
        &self,
        push_token: &str,
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> Result<()> {
        let Some(gateway_url) = &self.config.gateway_url else {
            debug!("Push gateway not configured, dropping message");
            return Ok(());
        };

        let message = PushMessage {
            to: push_token.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            data,
        };

        let mut request = self.client.post(gateway_url).json(&message);

        if let Some(key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Push gateway error {}: {}", status, body);
        }

        info!("Push message delivered to device handle");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_gateway_drops_silently() {
        let client = PushClient::new(PushConfig {
            gateway_url: None,
            api_key: None,
        });

        let result = client
            .send("device-1", "Title", "Body", serde_json::json!({}))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn unreachable_gateway_is_an_error() {
        let client = PushClient::new(PushConfig {
            gateway_url: Some("http://127.0.0.1:9/push".to_string()),
            api_key: None,
        });

        let result = client
            .send("device-1", "Title", "Body", serde_json::json!({}))
            .await;

        assert!(result.is_err());
    }
}
