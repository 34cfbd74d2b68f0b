/// Telnyx Messaging API types
use serde::Serialize;

/// Telnyx API error types
#[derive(Debug, thiserror::Error)]
pub enum TelnyxError {
    /// Network-level error (connection failed, timeout, etc.)
    #[error("Network error: {0}")]
    Network(String),

    /// Telnyx API returned an error response
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Authentication failed (invalid API key)
    #[error("Authentication failed: {0}")]
    Authentication(String),
}

/// Outbound SMS payload for `POST /v2/messages`
#[derive(Debug, Serialize)]
pub(crate) struct SendMessageRequest {
    pub from: String,
    pub to: String,
    pub text: String,
}
