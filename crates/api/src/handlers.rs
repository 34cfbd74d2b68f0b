//! Route handler functions
//!
//! Each handler extracts its payload, runs the dispatcher, and shapes the
//! response. Dispatch errors become a generic failure reply with a 500, so
//! the sender always hears back and the process never crashes on one
//! message.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use daybook_domain::constants::DEFAULT_SESSION_KEY;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

use crate::state::AppState;

/// Reply used when dispatch fails outright.
const FAILURE_REPLY: &str = "Something broke. Try again?";

// =============================================================================
// POST /messages - JSON test endpoint
// =============================================================================

/// Request body for `POST /messages`
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    #[serde(default)]
    pub message: Option<String>,
    /// Conversation key; omitted means the shared default session.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Response body for `POST /messages`
///
/// `classification` echoes the raw classifier payload for diagnostics. It is
/// absent on turns that answered a pending question, which skip the
/// classifier entirely.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Value>,
}

/// POST /messages - mirror of the webhook semantics without SMS delivery
pub async fn post_message(
    State(state): State<AppState>,
    Json(body): Json<MessageRequest>,
) -> Response {
    let Some(message) = body.message.filter(|message| !message.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "No message provided" })),
        )
            .into_response();
    };
    let session_id = body.session_id.unwrap_or_else(|| DEFAULT_SESSION_KEY.to_string());

    match state.dispatcher.handle_message(&session_id, &message).await {
        Ok(outcome) => {
            let classification = outcome.classification.map(|c| c.raw);
            (StatusCode::OK, Json(MessageResponse { reply: outcome.reply, classification }))
                .into_response()
        }
        Err(err) => {
            error!(error = %err, "dispatch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "reply": FAILURE_REPLY, "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

// =============================================================================
// POST /webhooks/telnyx - inbound SMS
// =============================================================================

/// Telnyx webhook envelope
///
/// Every field is optional; the handler decides what a partial payload
/// means rather than letting deserialization reject it.
#[derive(Debug, Deserialize)]
pub struct TelnyxWebhook {
    #[serde(default)]
    pub data: Option<TelnyxEventData>,
}

#[derive(Debug, Deserialize)]
pub struct TelnyxEventData {
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub payload: Option<TelnyxMessagePayload>,
}

#[derive(Debug, Deserialize)]
pub struct TelnyxMessagePayload {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub from: Option<TelnyxSender>,
}

#[derive(Debug, Deserialize)]
pub struct TelnyxSender {
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// POST /webhooks/telnyx - inbound SMS
///
/// Non-message events are acknowledged with 200 so Telnyx does not retry
/// them. The sender's number keys the conversation session, and the reply
/// goes back out through the Telnyx messages API when delivery is
/// configured.
pub async fn telnyx_webhook(
    State(state): State<AppState>,
    Json(body): Json<TelnyxWebhook>,
) -> Response {
    let event_type = body.data.as_ref().and_then(|data| data.event_type.as_deref());
    if event_type != Some("message.received") {
        return (StatusCode::OK, "OK").into_response();
    }

    let payload = body.data.and_then(|data| data.payload);
    let Some((text, sender)) = payload.and_then(|payload| {
        let text = payload.text.filter(|text| !text.is_empty())?;
        let sender = payload.from.and_then(|from| from.phone_number)?;
        Some((text, sender))
    }) else {
        return (StatusCode::BAD_REQUEST, "No message received").into_response();
    };

    match state.dispatcher.handle_message(&sender, &text).await {
        Ok(outcome) => {
            if let Some(messenger) = &state.messenger {
                if let Err(err) = messenger.send_message(&sender, &outcome.reply).await {
                    error!(error = %err, "failed to deliver sms reply");
                    return (StatusCode::INTERNAL_SERVER_ERROR, "Error processing message")
                        .into_response();
                }
            } else {
                warn!("messaging not configured; reply not delivered");
            }
            (StatusCode::OK, "Message sent").into_response()
        }
        Err(err) => {
            error!(error = %err, "dispatch failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error processing message").into_response()
        }
    }
}

// =============================================================================
// GET /health
// =============================================================================

/// Response body for `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /health - liveness plus a database probe
pub async fn health(State(state): State<AppState>) -> Response {
    match state.db.health_check() {
        Ok(()) => {
            (StatusCode::OK, Json(HealthResponse { status: "ok".to_string(), error: None }))
                .into_response()
        }
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "degraded".to_string(),
                error: Some(err.to_string()),
            }),
        )
            .into_response(),
    }
}
