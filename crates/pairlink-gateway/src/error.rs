//! API error types and responses.
//!
//! Every failure leaves the gateway as `{"success": false, "error": ...}`,
//! with `details` carrying the connector's message when a send fails.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use pairlink_core::CoreError;
use pairlink_session::SessionError;

/// Message for a request without both `number` and `message`.
pub const MISSING_FIELDS: &str = "Missing 'number' or 'message' in request body.";

/// Message for a `number` that is not all digits.
pub const INVALID_NUMBER: &str =
    "Invalid 'number' format. Should be digits only (country code + number).";

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or wrong shared secret.
    #[error("Unauthorized: invalid or missing secret key.")]
    Unauthorized,

    /// The messaging session cannot send right now.
    #[error("Messaging client is not ready. Please try again shortly.")]
    NotReady,

    /// Invalid request body or parameters.
    #[error("{0}")]
    BadRequest(String),

    /// The requested resource was not found.
    #[error("{0}")]
    NotFound(String),

    /// The request body is larger than the configured limit.
    #[error("Request body too large.")]
    PayloadTooLarge,

    /// The connector rejected or failed the send.
    #[error("Failed to send message.")]
    SendFailed(String),

    /// Internal server error.
    #[error("Internal server error.")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::SendFailed(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::NotReady => "not_ready",
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::PayloadTooLarge => "payload_too_large",
            Self::SendFailed(_) => "send_failed",
            Self::Internal(_) => "internal_error",
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::SendFailed(detail) => Some(detail.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: self.code(),
            details: self.details(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MissingField(_) => Self::BadRequest(MISSING_FIELDS.to_string()),
            CoreError::InvalidDestination(_) => Self::BadRequest(INVALID_NUMBER.to_string()),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotReady(_) => Self::NotReady,
            SessionError::Send(detail) => Self::SendFailed(detail),
            SessionError::Timeout { .. } => Self::SendFailed(err.to_string()),
            SessionError::Connect(_) | SessionError::Destroy(_) | SessionError::Internal(_) => {
                tracing::error!(error = %err, "Session error");
                Self::Internal(err.to_string())
            }
        }
    }
}
