//! Terminal rendering of pairing codes.
//!
//! The code is drawn straight to stdout as a QR code for the operator to
//! scan. It never goes through `tracing`, so log pipelines only ever see its
//! length.

use std::io::Write;

use pairlink_core::PairingCode;
use qrcode::render::unicode;
use qrcode::types::QrError;
use qrcode::QrCode;

/// Render `code` as a QR code using half-height unicode blocks.
///
/// # Errors
///
/// Returns `QrError` if the code is too long to fit in a QR symbol.
pub fn render_pairing_code(code: &PairingCode) -> Result<String, QrError> {
    let qr = QrCode::new(code.as_str().as_bytes())?;
    Ok(qr
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .quiet_zone(true)
        .build())
}

/// Print `code` to stdout for scanning.
pub fn print_pairing_code(code: &PairingCode) {
    let art = match render_pairing_code(code) {
        Ok(art) => art,
        Err(e) => {
            tracing::warn!(error = %e, code_len = code.len(), "Could not render pairing code");
            return;
        }
    };

    let mut out = std::io::stdout().lock();
    let _ = writeln!(
        out,
        "\nPairing code received. Scan it with the companion app:\n\n{art}\n"
    );
    let _ = out.flush();
}
