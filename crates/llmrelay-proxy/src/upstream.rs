//! Non-streaming request forwarding to the gateway.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value as JsonValue;
use tracing::{error, info};

use llmrelay_core::GatewaySettings;

use crate::error::UpstreamError;

/// Header carrying the relay's client identifier.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// Header carrying the relay's client secret.
pub const CLIENT_SECRET_HEADER: &str = "x-client-secret";

/// Client for single round-trip forwarding to the gateway.
///
/// Wraps the process-wide pooled HTTPS client; construction is cheap and
/// never builds a new connection pool.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    settings: GatewaySettings,
    request_timeout: Duration,
}

impl GatewayClient {
    /// Create a forwarder over the shared client.
    #[must_use]
    pub const fn new(client: Client, settings: GatewaySettings, request_timeout: Duration) -> Self {
        Self {
            client,
            settings,
            request_timeout,
        }
    }

    /// Identifying headers and endpoints in use.
    #[must_use]
    pub const fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Forward a chat completion request and return the gateway's JSON.
    ///
    /// # Errors
    ///
    /// [`UpstreamError::Status`] for non-success responses (body captured
    /// verbatim), [`UpstreamError::Unreachable`] when no response arrived.
    pub async fn forward_chat(&self, body: &JsonValue) -> Result<JsonValue, UpstreamError> {
        info!(url = %self.settings.chat_url, "Forwarding chat request to gateway");
        self.forward(&self.settings.chat_url, body).await
    }

    /// Forward an OCR request and return the gateway's JSON.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::forward_chat`].
    pub async fn forward_ocr(&self, body: &JsonValue) -> Result<JsonValue, UpstreamError> {
        info!(url = %self.settings.ocr_url, "Forwarding OCR request to gateway");
        self.forward(&self.settings.ocr_url, body).await
    }

    async fn forward(&self, url: &str, body: &JsonValue) -> Result<JsonValue, UpstreamError> {
        let response = self
            .client
            .post(url)
            .timeout(self.request_timeout)
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .header(CLIENT_ID_HEADER, &self.settings.client_id)
            .header(CLIENT_SECRET_HEADER, &self.settings.client_secret)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Capture the full body so the diagnostic text survives.
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), %body, "Gateway returned an error response");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json = response.json::<JsonValue>().await?;
        Ok(json)
    }
}
