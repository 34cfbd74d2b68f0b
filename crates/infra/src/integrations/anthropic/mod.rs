/// Anthropic integration for message understanding
///
/// This module provides an Anthropic Messages API client that backs two ports:
/// intent classification for inbound messages and daily recap generation.
///
/// # Architecture
///
/// - **Client**: `AnthropicClient` - HTTP client wrapper for the Messages API
/// - **Types**: Request/response types plus the integration error enum
///
/// # API Integration
///
/// Uses Anthropic's Messages API with two models:
/// - Classification: `claude-3-haiku-20240307` (cheap, 1024 max tokens)
/// - Recaps: `claude-sonnet-4-20250514` (300 max tokens)
///
/// Both are configurable via `with_model()` / `with_recap_model()`.
///
/// # Error Handling
///
/// - **Network errors**: Automatically retried by `HttpClient`
/// - **Server errors (5xx)**: Retried with exponential backoff
/// - **Client errors (4xx)**: Not retried
/// - **Unparseable completions**: Never an error; the classifier degrades to
///   the unknown intent and the recap writer falls back to a canned line
pub mod client;
pub mod types;

pub use client::AnthropicClient;
pub use types::AnthropicError;
