/// Telnyx Messaging API client for outbound SMS
use daybook_domain::{DaybookError, Result as DomainResult};
use reqwest::Method;
use tracing::{debug, info};

use crate::http::HttpClient;

use super::types::{SendMessageRequest, TelnyxError};

const TELNYX_API_URL: &str = "https://api.telnyx.com";

/// Telnyx API client for sending SMS replies
pub struct TelnyxClient {
    http_client: HttpClient,
    api_key: String,
    from_number: String,
    api_url: String,
}

impl TelnyxClient {
    /// Create a new Telnyx client
    ///
    /// # Arguments
    /// * `api_key` - Telnyx API key (required)
    /// * `from_number` - E.164 sender number replies are sent from
    /// * `http_client` - HTTP client with retry logic
    pub fn new(api_key: String, from_number: String, http_client: HttpClient) -> Self {
        Self { http_client, api_key, from_number, api_url: TELNYX_API_URL.to_string() }
    }

    /// Create a new client with custom API URL (for testing)
    #[cfg(test)]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Send one SMS to `to`
    pub async fn send_message(&self, to: &str, text: &str) -> DomainResult<()> {
        self.send(to, text).await.map_err(|err| DaybookError::Messaging(err.to_string()))
    }

    async fn send(&self, to: &str, text: &str) -> Result<(), TelnyxError> {
        let request = SendMessageRequest {
            from: self.from_number.clone(),
            to: to.to_string(),
            text: text.to_string(),
        };

        let request_builder = self
            .http_client
            .request(Method::POST, format!("{}/v2/messages", self.api_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request);

        // Execute with retry (handled by HttpClient)
        let response = self.http_client.send(request_builder).await.map_err(|err| match err {
            DaybookError::Network(msg) => TelnyxError::Network(msg),
            DaybookError::Internal(msg) => TelnyxError::Network(msg),
            other => TelnyxError::Network(format!("HTTP error: {other}")),
        })?;

        let status = response.status();
        debug!(status = status.as_u16(), "Received Telnyx API response");

        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(match status.as_u16() {
                401 | 403 => {
                    TelnyxError::Authentication(format!("Invalid API key ({})", status.as_u16()))
                }
                code => TelnyxError::Api { status: code, message },
            });
        }

        info!(chars = text.len(), "sms reply sent");
        Ok(())
    }
}
