//! Core types and utilities for pairlink.
//!
//! This crate provides the foundational types shared by the session and
//! gateway crates:
//!
//! - **Identifiers**: validated destinations, channel identifiers, message IDs
//!   and pairing codes
//! - **Session model**: the lifecycle states and the events that drive them
//! - **Error types**: common error definitions shared across crates
//!
//! # Example
//!
//! ```
//! use pairlink_core::{ChatId, Destination};
//!
//! let destination = Destination::parse("6281234567890").unwrap();
//! let chat_id = ChatId::from(&destination);
//! assert_eq!(chat_id.as_str(), "6281234567890@c.us");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod state;

pub use error::{CoreError, Result};
pub use ids::{ChatId, Destination, MessageId, PairingCode, CHAT_ID_SUFFIX};
pub use state::{LifecycleEvent, SessionState};
