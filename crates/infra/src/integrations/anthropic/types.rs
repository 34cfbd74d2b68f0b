/// Anthropic Messages API types
use serde::{Deserialize, Serialize};

/// Anthropic API error types
#[derive(Debug, thiserror::Error)]
pub enum AnthropicError {
    /// Network-level error (connection failed, timeout, etc.)
    #[error("Network error: {0}")]
    Network(String),

    /// Anthropic API returned an error response
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Authentication failed (invalid API key)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Response body doesn't match expected schema
    #[error("Invalid response schema: {0}")]
    InvalidSchema(String),
}

/// Internal types for the Messages API
#[derive(Debug, Serialize)]
pub(crate) struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<MessageParam>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MessageParam {
    pub role: String,
    pub content: String,
}

/// Response from the Messages API
#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
    pub content: Vec<ContentBlock>,
}

/// One entry of the response `content` array. Only `text` blocks carry a
/// completion; anything else (tool use etc.) leaves `text` empty.
#[derive(Debug, Deserialize)]
pub(crate) struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl MessagesResponse {
    /// Text of the first content block, if it is a text block.
    pub(crate) fn first_text(&self) -> Option<&str> {
        let block = self.content.first()?;
        if block.block_type == "text" {
            block.text.as_deref()
        } else {
            None
        }
    }
}
