//! Session lifecycle state machine.
//!
//! This module defines how connector events move the session between states.
//! The functions here are pure; [`SessionSupervisor`](crate::SessionSupervisor)
//! applies them one event at a time.
//!
//! # State Machine
//!
//! ```text
//!          (connect / reconnect)
//!     ┌──────────────────────────────┐
//!     ▼                              │
//! ┌──────────┐  pairing-code  ┌────────────────┐
//! │ Unpaired │───────────────▶│ PairingPending │◀─┐ pairing-code
//! └────┬─────┘                └───────┬────────┘──┘
//!      │ authenticated                │ authenticated
//!      │ (restored session)           ▼
//!      │                      ┌───────────────┐
//!      └─────────────────────▶│ Authenticated │
//!                             └───────┬───────┘
//!                                     │ ready
//!                                     ▼
//!                             ┌───────────────┐
//!                             │     Ready     │
//!                             └───────┬───────┘
//!                                     │ disconnected (from any state)
//!                                     ▼
//!                             ┌───────────────┐
//!                             │ Disconnected  │── reconnect ──▶ Unpaired
//!                             └───────────────┘
//! ```
//!
//! `auth-failed` moves any live state to `Disconnected` without scheduling a
//! reconnect; the pairing code is kept.

use pairlink_core::{LifecycleEvent, SessionState};

/// Returns the state an event moves the session into, or `None` if the
/// event does not apply in the current state.
#[must_use]
pub const fn next_state(from: SessionState, event: &LifecycleEvent) -> Option<SessionState> {
    use SessionState::{Authenticated, Disconnected, PairingPending, Ready, Unpaired};

    match event {
        // The engine rotates codes while waiting, and asks for a new one when
        // a live session is lost.
        LifecycleEvent::PairingCode(_) => Some(PairingPending),
        LifecycleEvent::Authenticated => match from {
            Unpaired | PairingPending => Some(Authenticated),
            Authenticated | Ready | Disconnected => None,
        },
        LifecycleEvent::AuthFailed { .. } => match from {
            Disconnected => None,
            Unpaired | PairingPending | Authenticated | Ready => Some(Disconnected),
        },
        LifecycleEvent::Ready => Some(Ready),
        LifecycleEvent::Disconnected { .. } => Some(Disconnected),
    }
}

/// Returns true if applying this event should schedule a reconnect.
#[must_use]
pub const fn schedules_reconnect(event: &LifecycleEvent) -> bool {
    matches!(event, LifecycleEvent::Disconnected { .. })
}

/// Returns true if a reconnect may start from this state.
#[must_use]
pub const fn can_reconnect(state: SessionState) -> bool {
    matches!(state, SessionState::Disconnected)
}

/// Returns true if outbound sends are allowed in this state.
#[must_use]
pub const fn accepts_sends(state: SessionState) -> bool {
    matches!(state, SessionState::Ready)
}
