//! Error types for session management.
//!
//! This module defines all errors that can occur while driving the external
//! messaging session.

use std::time::Duration;

use pairlink_core::SessionState;
use thiserror::Error;

/// A result type using `SessionError`.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that can occur in session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session is not ready to send messages.
    #[error("session is not ready (state: {0})")]
    NotReady(SessionState),

    /// Starting the external session failed.
    #[error("connect failed: {0}")]
    Connect(String),

    /// The engine failed to deliver a message.
    #[error("send failed: {0}")]
    Send(String),

    /// Tearing down the external session failed.
    #[error("destroy failed: {0}")]
    Destroy(String),

    /// A connector operation did not finish in time.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
        /// How long it was given.
        after: Duration,
    },

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SessionError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotReady(_) => 503,
            Self::Connect(_)
            | Self::Send(_)
            | Self::Destroy(_)
            | Self::Timeout { .. }
            | Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error might be resolved by retrying.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::NotReady(_) | Self::Connect(_) | Self::Send(_) | Self::Timeout { .. }
        )
    }
}
