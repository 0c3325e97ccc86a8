//! Readiness gate.
//!
//! A lock-free predicate the HTTP layer consults before touching the
//! connector. The supervisor flips it on state transitions; shutdown latches
//! it closed so late `ready` events cannot reopen it.

use std::sync::atomic::{AtomicBool, Ordering};

/// Tracks whether the session currently accepts outbound sends.
#[derive(Debug, Default)]
pub struct ReadinessGate {
    ready: AtomicBool,
    closed: AtomicBool,
}

impl ReadinessGate {
    /// Create a gate that starts not ready.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Whether sends are currently accepted.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.closed.load(Ordering::Acquire) && self.ready.load(Ordering::Acquire)
    }

    /// Record the readiness derived from the latest state transition.
    pub(crate) fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    /// Latch the gate closed for shutdown. Irreversible.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_not_ready() {
        let gate = ReadinessGate::new();
        assert!(!gate.is_ready());
        assert!(!gate.is_closed());
    }

    #[test]
    fn follows_set_ready() {
        let gate = ReadinessGate::new();
        gate.set_ready(true);
        assert!(gate.is_ready());
        gate.set_ready(false);
        assert!(!gate.is_ready());
    }

    #[test]
    fn close_overrides_ready() {
        let gate = ReadinessGate::new();
        gate.set_ready(true);
        gate.close();
        assert!(!gate.is_ready());

        gate.set_ready(true);
        assert!(!gate.is_ready());
        assert!(gate.is_closed());
    }
}
