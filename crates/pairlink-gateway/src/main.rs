//! Pairlink Gateway - HTTP bridge to a paired messaging session
//!
//! This is the main entry point for the gateway service. Configuration is
//! read from the environment, after loading a `.env` file if one exists;
//! see [`GatewayConfig::from_env`].
//!
//! # Exit codes
//!
//! - `0` after a graceful shutdown
//! - `1` if startup fails or shutdown overruns `SHUTDOWN_TIMEOUT_SECONDS`

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pairlink_gateway::{
    create_router, shutdown_signal, GatewayConfig, GatewayState, ShutdownOrchestrator,
};
use pairlink_session::{event_channel, EngineConfig, EngineConnector, SessionSupervisor};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env before anything reads the environment, RUST_LOG included
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pairlink=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Pairlink Gateway");
    match dotenv {
        Ok(path) => tracing::info!(path = %path.display(), "Loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Could not load .env file"),
    }

    let config = GatewayConfig::from_env();
    tracing::info!(
        listen_addr = %config.listen_addr(),
        engine_url = %config.engine_url,
        static_dir = %config.static_dir,
        reconnect = ?config.session.reconnect,
        shutdown_timeout = ?config.shutdown_timeout(),
        has_secret = config.secret_key.is_some(),
        "Gateway configuration loaded"
    );

    if config.secret_key.is_none() {
        tracing::warn!("No SECRET_KEY set - every protected request will be rejected");
    }

    // Bind before connecting so /health and /qr-code answer during pairing
    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;

    let (events_tx, events_rx) = event_channel();
    let connector = Arc::new(EngineConnector::new(
        EngineConfig::new(&config.engine_url),
        events_tx,
    )?);
    let session = Arc::new(SessionSupervisor::new(connector, config.session.clone()));
    session.spawn(events_rx);
    tracing::info!("Session supervisor started");

    let state = GatewayState::new(Arc::clone(&session), config.clone());
    let app = create_router(state);

    tracing::info!(listen_addr = %config.listen_addr(), "API server listening");
    let outcome = ShutdownOrchestrator::new(session, config.shutdown_timeout())
        .serve(listener, app, shutdown_signal())
        .await;

    tracing::info!(outcome = ?outcome, "Gateway stopped");
    std::process::exit(outcome.exit_code());
}
