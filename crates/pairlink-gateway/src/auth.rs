//! Shared-secret access filter.
//!
//! Every request outside the public allow-list must present the configured
//! secret. The first non-empty credential found is the one checked:
//!
//! 1. `x-api-key` header
//! 2. `secret` query parameter
//! 3. `secret` field of a JSON request body
//!
//! With no secret configured, protected routes reject everything.
//!
//! Besides the fixed allow-list, a `GET` or `HEAD` for a file that exists
//! in the front-end directory is public, so the pairing page can load its
//! assets by relative path.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Query, Request, State};
use axum::http::{HeaderMap, Method, Uri};
use axum::middleware::Next;
use axum::response::Response;
use http_body_util::LengthLimitError;

use pairlink_session::SessionConnector;

use crate::error::ApiError;
use crate::state::GatewayState;

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Query parameter and body field carrying the shared secret.
pub const SECRET_PARAM: &str = "secret";

/// A configured shared secret, held only as a digest.
///
/// Comparison hashes the candidate and compares digests, which
/// `blake3::Hash` does in constant time.
#[derive(Clone)]
pub struct SecretKey(blake3::Hash);

impl SecretKey {
    /// Digest `raw`. Returns `None` for an empty secret.
    #[must_use]
    pub fn new(raw: &str) -> Option<Self> {
        (!raw.is_empty()).then(|| Self(blake3::hash(raw.as_bytes())))
    }

    /// Whether `candidate` is the configured secret.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        blake3::hash(candidate.as_bytes()) == self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Paths that never require the secret.
#[must_use]
pub fn is_public_path(path: &str) -> bool {
    matches!(path, "/" | "/health" | "/qr-code")
        || under(path, "/static")
        || under(path, "/frontend")
}

fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Whether `path` names a regular file inside `static_dir`.
///
/// Paths that try to leave the directory never match.
pub async fn is_static_file(static_dir: &Path, path: &str) -> bool {
    let relative = path.trim_start_matches('/');
    if relative.is_empty()
        || relative
            .split('/')
            .any(|segment| segment == ".." || segment.contains('\\'))
    {
        return false;
    }

    tokio::fs::metadata(static_dir.join(relative))
        .await
        .is_ok_and(|meta| meta.is_file())
}

/// Middleware enforcing the shared secret on protected routes.
///
/// The body is only buffered when neither the header nor the query carries
/// a credential; the handler then receives the same bytes.
///
/// # Errors
///
/// Returns [`ApiError::Unauthorized`] when the credential is missing or wrong,
/// or when no secret is configured. A buffered body over the configured limit
/// is [`ApiError::PayloadTooLarge`].
pub async fn require_secret<C>(
    State(state): State<Arc<GatewayState<C>>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    C: SessionConnector + 'static,
{
    let path = request.uri().path();
    let reads = matches!(*request.method(), Method::GET | Method::HEAD);
    if is_public_path(path)
        || (reads && is_static_file(Path::new(&state.config.static_dir), path).await)
    {
        return Ok(next.run(request).await);
    }

    let Some(secret) = state.secret.as_ref() else {
        tracing::warn!(path, "Rejecting request: no secret key configured");
        return Err(ApiError::Unauthorized);
    };

    let presented =
        header_credential(request.headers()).or_else(|| query_credential(request.uri()));
    let (candidate, request) = match presented {
        Some(candidate) => (Some(candidate), request),
        None => {
            let (parts, body) = request.into_parts();
            let bytes = axum::body::to_bytes(body, state.config.max_body_bytes)
                .await
                .map_err(|err| {
                    if exceeds_limit(&err) {
                        ApiError::PayloadTooLarge
                    } else {
                        ApiError::BadRequest(format!("unreadable request body: {err}"))
                    }
                })?;
            let candidate = body_credential(&bytes);
            (candidate, Request::from_parts(parts, Body::from(bytes)))
        }
    };

    match candidate {
        Some(candidate) if secret.matches(&candidate) => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!(path = %request.uri().path(), "Rejecting request: wrong secret");
            Err(ApiError::Unauthorized)
        }
        None => {
            tracing::debug!(path = %request.uri().path(), "Rejecting request: no secret presented");
            Err(ApiError::Unauthorized)
        }
    }
}

fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

fn header_credential(headers: &HeaderMap) -> Option<String> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn query_credential(uri: &Uri) -> Option<String> {
    let Query(mut params) = Query::<HashMap<String, String>>::try_from_uri(uri).ok()?;
    params.remove(SECRET_PARAM).filter(|value| !value.is_empty())
}

fn body_credential(bytes: &Bytes) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    value
        .get(SECRET_PARAM)?
        .as_str()
        .filter(|secret| !secret.is_empty())
        .map(str::to_string)
}
