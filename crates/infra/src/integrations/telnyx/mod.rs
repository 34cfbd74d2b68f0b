/// Telnyx integration for outbound SMS
///
/// Replies leave the system through this client. The inbound leg is a plain
/// webhook handled by the API layer; only sending needs an API client.
///
/// # Error Handling
///
/// - **Network errors**: Automatically retried by `HttpClient`
/// - **Server errors (5xx)**: Retried with exponential backoff
/// - **Client errors (4xx)**: Not retried
pub mod client;
pub mod types;

pub use client::TelnyxClient;
pub use types::TelnyxError;
