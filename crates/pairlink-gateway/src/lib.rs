//! HTTP gateway for the pairlink messaging bridge.
//!
//! This crate exposes the paired messaging session over a small HTTP API:
//!
//! - shared-secret access control with a public allow-list
//! - `POST /send-message` gated on session readiness
//! - `GET /qr-code` and `GET /health` for pairing and monitoring
//! - the bundled pairing front-end
//! - graceful shutdown under a watchdog budget
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Clients                              │
//! │              (HTTP automation / pairing page)               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    pairlink-gateway                         │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐   │
//! │  │   Access    │ │   Router    │ │    Shutdown         │   │
//! │  │   filter    │ │  + Handlers │ │    orchestrator     │   │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                   ┌─────────────────────┐
//!                   │  SessionSupervisor  │
//!                   │  (pairlink-session) │
//!                   └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pairlink_gateway::{create_router, shutdown_signal, GatewayConfig, GatewayState, ShutdownOrchestrator};
//! use pairlink_session::{event_channel, EngineConfig, EngineConnector, SessionSupervisor};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::from_env();
//!
//! let (events_tx, events_rx) = event_channel();
//! let connector = Arc::new(EngineConnector::new(EngineConfig::new(&config.engine_url), events_tx)?);
//! let session = Arc::new(SessionSupervisor::new(connector, config.session.clone()));
//! session.spawn(events_rx);
//!
//! let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
//! let app = create_router(GatewayState::new(Arc::clone(&session), config.clone()));
//!
//! let outcome = ShutdownOrchestrator::new(session, config.shutdown_timeout())
//!     .serve(listener, app, shutdown_signal())
//!     .await;
//! std::process::exit(outcome.exit_code());
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod shutdown;
pub mod state;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use shutdown::{shutdown_signal, ShutdownOrchestrator, ShutdownOutcome};
pub use state::GatewayState;
