//! Pairing code endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use pairlink_core::PairingCode;
use pairlink_session::SessionConnector;

use crate::error::ApiError;
use crate::state::GatewayState;

/// Response carrying the current pairing code.
#[derive(Debug, Serialize)]
pub struct QrCodeResponse {
    /// Always `true`.
    pub success: bool,
    /// Opaque code for the companion app to scan.
    #[serde(rename = "qrCode")]
    pub qr_code: PairingCode,
}

/// Return the most recent pairing code.
///
/// Public, so an operator can pair before any secret is shared. The code is
/// never written to the logs.
///
/// # Errors
///
/// Returns 404 when no code has been issued for the current session, or
/// once the session has paired.
pub async fn qr_code<C>(
    State(state): State<Arc<GatewayState<C>>>,
) -> Result<impl IntoResponse, ApiError>
where
    C: SessionConnector + 'static,
{
    let code = state.session.pairing_code().ok_or_else(|| {
        ApiError::NotFound(
            "QR code not available. Please initialize the client first.".to_string(),
        )
    })?;

    Ok(Json(QrCodeResponse {
        success: true,
        qr_code: code,
    }))
}
