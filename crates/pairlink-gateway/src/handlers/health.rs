//! Health check endpoint.
//!
//! Public. Reports whether the messaging session can send right now.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use pairlink_core::SessionState;
use pairlink_session::SessionConnector;

use crate::state::GatewayState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Whether the session is ready to send.
    pub success: bool,
    /// Human-readable status.
    pub message: &'static str,
    /// Current lifecycle state.
    pub state: SessionState,
    /// When the current state was entered.
    pub since: DateTime<Utc>,
    /// Service version.
    pub version: &'static str,
}

/// Health check handler.
///
/// # Example
///
/// ```text
/// GET /health
///
/// Response: 200 OK
/// {
///   "success": true,
///   "message": "Messaging client is ready and API is operational.",
///   "state": "ready",
///   "since": "2024-05-01T10:00:00Z",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health<C>(State(state): State<Arc<GatewayState<C>>>) -> impl IntoResponse
where
    C: SessionConnector + 'static,
{
    let snapshot = state.session.snapshot();
    let ready = state.session.is_ready();

    let (status, message) = if ready {
        (
            StatusCode::OK,
            "Messaging client is ready and API is operational.",
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "Messaging client is not ready. Please wait.",
        )
    };

    let response = HealthResponse {
        success: ready,
        message,
        state: snapshot.state,
        since: snapshot.since,
        version: env!("CARGO_PKG_VERSION"),
    };

    (status, Json(response))
}
