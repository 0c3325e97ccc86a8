//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::path::PathBuf;
use std::sync::Arc;

use axum::handler::HandlerWithoutStateExt;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use pairlink_session::SessionConnector;

use crate::auth;
use crate::handlers::{self, health, messages, pairing};
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Session readiness
/// - `GET /qr-code` - Current pairing code
/// - `GET /` - Front-end entry page
/// - `GET /static/*`, `GET /frontend/*` - Front-end assets
/// - `GET /*` - Any file present in the front-end directory
///
/// ## Protected (shared secret)
/// - `POST /send-message` - Send a text message
pub fn create_router<C>(state: GatewayState<C>) -> Router
where
    C: SessionConnector + 'static,
{
    // Extract config values before moving state
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout();
    let static_dir = PathBuf::from(&state.config.static_dir);

    let state = Arc::new(state);

    Router::new()
        .route("/health", get(health::health::<C>))
        .route("/qr-code", get(pairing::qr_code::<C>))
        .route("/send-message", post(messages::send_message::<C>))
        // Front-end
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(&static_dir))
        .nest_service("/frontend", ServeDir::new(&static_dir))
        .fallback_service(
            ServeDir::new(&static_dir)
                .call_fallback_on_method_not_allowed(true)
                .not_found_service(handlers::not_found.into_service()),
        )
        // Middleware
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_secret::<C>,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
    use axum_test::TestServer;

    use pairlink_session::{FakeConnector, SessionConfig, SessionSupervisor};

    use super::*;
    use crate::config::GatewayConfig;

    fn server_with_frontend(dir: &std::path::Path) -> TestServer {
        server_with(GatewayConfig {
            secret_key: Some("s3cret".to_string()),
            static_dir: dir.to_string_lossy().into_owned(),
            ..GatewayConfig::default()
        })
    }

    fn server_with(config: GatewayConfig) -> TestServer {
        let (connector, _events) = FakeConnector::new();
        let session = Arc::new(SessionSupervisor::new(
            Arc::new(connector),
            SessionConfig::default(),
        ));
        TestServer::new(create_router(GatewayState::new(session, config))).unwrap()
    }

    #[tokio::test]
    async fn serves_frontend_without_secret() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>pair</h1>").unwrap();
        fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
        let server = server_with_frontend(dir.path());

        let index = server.get("/").await;
        assert_eq!(index.status_code(), StatusCode::OK);
        assert_eq!(index.text(), "<h1>pair</h1>");

        let asset = server.get("/static/app.js").await;
        assert_eq!(asset.status_code(), StatusCode::OK);
        assert_eq!(asset.text(), "console.log(1)");

        let asset = server.get("/frontend/app.js").await;
        assert_eq!(asset.status_code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_paths_are_protected() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_with_frontend(dir.path());

        let response = server.get("/admin").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

        let response = server.get("/admin").add_query_param("secret", "s3cret").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn serves_root_assets_without_secret() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<script src=\"app.js\"></script>").unwrap();
        fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
        fs::write(dir.path().join("style.css"), "body {}").unwrap();
        let server = server_with_frontend(dir.path());

        let asset = server.get("/app.js").await;
        assert_eq!(asset.status_code(), StatusCode::OK);
        assert_eq!(asset.text(), "console.log(1)");

        let asset = server.get("/style.css").await;
        assert_eq!(asset.status_code(), StatusCode::OK);

        let index = server.get("/index.html").await;
        assert_eq!(index.status_code(), StatusCode::OK);

        let missing = server.get("/missing.js").await;
        assert_eq!(missing.status_code(), StatusCode::UNAUTHORIZED);

        let missing = server.get("/missing.js").add_query_param("secret", "s3cret").await;
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = missing.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn root_assets_do_not_open_other_methods() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
        let server = server_with_frontend(dir.path());

        let response = server.post("/app.js").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn cors_preflight_echoes_allowed_origin() {
        let server = server_with(GatewayConfig {
            secret_key: Some("s3cret".to_string()),
            cors_origins: vec!["http://a.test".to_string()],
            ..GatewayConfig::default()
        });
        let allow_origin = HeaderName::from_static("access-control-allow-origin");

        let allowed = server
            .method(Method::OPTIONS, "/send-message")
            .add_header(
                HeaderName::from_static("origin"),
                HeaderValue::from_static("http://a.test"),
            )
            .add_header(
                HeaderName::from_static("access-control-request-method"),
                HeaderValue::from_static("POST"),
            )
            .await;
        assert_eq!(allowed.status_code(), StatusCode::OK);
        assert_eq!(allowed.header(allow_origin.clone()), "http://a.test");

        let other = server
            .method(Method::OPTIONS, "/send-message")
            .add_header(
                HeaderName::from_static("origin"),
                HeaderValue::from_static("http://b.test"),
            )
            .add_header(
                HeaderName::from_static("access-control-request-method"),
                HeaderValue::from_static("POST"),
            )
            .await;
        assert!(other.headers().get(&allow_origin).is_none());
    }

    #[tokio::test]
    async fn wildcard_cors_allows_any_origin() {
        let server = server_with(GatewayConfig::default());

        let response = server
            .get("/health")
            .add_header(
                HeaderName::from_static("origin"),
                HeaderValue::from_static("http://anywhere.test"),
            )
            .await;
        assert_eq!(
            response.header(HeaderName::from_static("access-control-allow-origin")),
            "*"
        );
    }
}
