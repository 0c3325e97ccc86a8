//! Session lifecycle management for the pairlink messaging bridge.
//!
//! This crate owns the single external messaging session. It turns the
//! engine's lifecycle events into a well-defined state, decides when the
//! session may send, and reconnects when it drops.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Gateway (HTTP)                          │
//! └─────────────────────────────────────────────────────────────┘
//!                 │ reads state / send()          ▲
//!                 ▼                               │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   SessionSupervisor                         │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐   │
//! │  │  Lifecycle  │ │  Readiness  │ │    Reconnect        │   │
//! │  │  rules      │ │  gate       │ │    policy           │   │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                 │ connect/send/destroy          ▲ lifecycle events
//!                 ▼                               │
//! ┌─────────────────────────────────────────────────────────────┐
//! │            SessionConnector (engine bridge)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use pairlink_session::{
//!     event_channel, EngineConfig, EngineConnector, SessionConfig, SessionSupervisor,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (events_tx, events_rx) = event_channel();
//! let connector = Arc::new(EngineConnector::new(
//!     EngineConfig::new("http://localhost:8090"),
//!     events_tx,
//! )?);
//!
//! let supervisor = Arc::new(SessionSupervisor::new(connector, SessionConfig::default()));
//! supervisor.spawn(events_rx);
//!
//! // Later, once the companion app has scanned the pairing code:
//! if supervisor.is_ready() {
//!     let destination = "6281234567890".parse()?;
//!     let id = supervisor.send(&destination, "Hello").await?;
//!     println!("sent {id}");
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod connector;
pub mod display;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod readiness;
pub mod supervisor;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use connector::{event_channel, EventReceiver, EventSender, SessionConnector};
pub use display::{print_pairing_code, render_pairing_code};
pub use engine::{EngineConfig, EngineConnector};
pub use error::{Result, SessionError};
pub use readiness::ReadinessGate;
pub use supervisor::{SessionSupervisor, StateSnapshot};
pub use types::{ReconnectPolicy, SessionConfig};

#[cfg(any(test, feature = "test-utils"))]
pub use testing::FakeConnector;

// Re-export commonly used types from dependencies for convenience
pub use pairlink_core::{ChatId, Destination, LifecycleEvent, MessageId, PairingCode, SessionState};
