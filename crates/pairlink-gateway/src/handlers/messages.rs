//! Message send endpoint.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use pairlink_core::{Destination, MessageId};
use pairlink_session::SessionConnector;

use crate::error::{ApiError, MISSING_FIELDS};
use crate::state::GatewayState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Request to send a text message.
///
/// Unknown fields, including the `secret` credential, are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct SendMessageRequest {
    /// Destination digits. Also accepted as a bare JSON integer.
    #[serde(default)]
    pub number: Option<NumberField>,
    /// Message text.
    #[serde(default)]
    pub message: Option<String>,
}

/// The `number` field as clients send it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NumberField {
    /// `"6281234567890"`
    Text(String),
    /// `6281234567890`
    Integer(u64),
}

impl From<NumberField> for String {
    fn from(field: NumberField) -> Self {
        match field {
            NumberField::Text(text) => text,
            NumberField::Integer(n) => n.to_string(),
        }
    }
}

/// Response for an accepted message.
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable status.
    pub message: &'static str,
    /// Identifier the connector assigned.
    #[serde(rename = "messageId")]
    pub message_id: MessageId,
}

// =============================================================================
// Handlers
// =============================================================================

/// Send a text message to a destination number.
///
/// Checks run in a fixed order: readiness (503), field presence (400),
/// number format (400). Only then is the connector called.
///
/// # Errors
///
/// Returns 503 when the session is not ready, 400 for a malformed request,
/// or 500 with `details` when the connector fails.
pub async fn send_message<C>(
    State(state): State<Arc<GatewayState<C>>>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    C: SessionConnector + 'static,
{
    if !state.session.is_ready() {
        return Err(ApiError::NotReady);
    }

    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Unparseable send request");
            SendMessageRequest::default()
        }
    };

    let number = request.number.map(String::from).unwrap_or_default();
    let message = request.message.unwrap_or_default();
    if number.is_empty() || message.is_empty() {
        return Err(ApiError::BadRequest(MISSING_FIELDS.to_string()));
    }

    let destination = Destination::parse(&number)?;

    let message_id = state
        .session
        .send(&destination, &message)
        .await
        .map_err(|err| {
            tracing::error!(destination = %destination, error = %err, "Failed to send message");
            ApiError::from(err)
        })?;

    tracing::info!(destination = %destination, message_id = %message_id, "Message sent");

    Ok(Json(SendMessageResponse {
        success: true,
        message: "Message sent successfully!",
        message_id,
    }))
}
