//! Session lifecycle model.
//!
//! The external messaging session moves through a small set of states,
//! driven by events the engine emits. The transition rules themselves live
//! in `pairlink-session`; this module only defines the vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::PairingCode;

/// Lifecycle state of the single external session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// A session is being started and no pairing code has been issued yet.
    #[default]
    Unpaired,
    /// A pairing code was issued and is waiting to be scanned.
    PairingPending,
    /// The companion app accepted the pairing; the session is loading.
    Authenticated,
    /// The session accepts outbound messages.
    Ready,
    /// The session was lost or rejected.
    Disconnected,
}

impl SessionState {
    /// Stable snake-case name, matching the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaired => "unpaired",
            Self::PairingPending => "pairing_pending",
            Self::Authenticated => "authenticated",
            Self::Ready => "ready",
            Self::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event emitted by the session connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The engine needs the user to scan a new pairing code.
    PairingCode(PairingCode),
    /// The companion app accepted the pairing (or a stored session was restored).
    Authenticated,
    /// The engine rejected the stored or scanned credentials.
    AuthFailed {
        /// Engine-provided failure description.
        message: String,
    },
    /// The session finished loading and can send messages.
    Ready,
    /// The session was logged out or the connection dropped.
    Disconnected {
        /// Engine-provided reason.
        reason: String,
    },
}

impl LifecycleEvent {
    /// Short event name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PairingCode(_) => "pairing-code",
            Self::Authenticated => "authenticated",
            Self::AuthFailed { .. } => "auth-failed",
            Self::Ready => "ready",
            Self::Disconnected { .. } => "disconnected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_unpaired() {
        assert_eq!(SessionState::default(), SessionState::Unpaired);
    }

    #[test]
    fn state_names_match_serde() {
        for state in [
            SessionState::Unpaired,
            SessionState::PairingPending,
            SessionState::Authenticated,
            SessionState::Ready,
            SessionState::Disconnected,
        ] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state.as_str()));
        }
    }

    #[test]
    fn event_names() {
        assert_eq!(
            LifecycleEvent::PairingCode(PairingCode::new("x")).name(),
            "pairing-code"
        );
        assert_eq!(
            LifecycleEvent::Disconnected {
                reason: "LOGOUT".into()
            }
            .name(),
            "disconnected"
        );
    }
}
