//! Session supervisor.
//!
//! This module provides `SessionSupervisor`, the single owner of the external
//! session's state. It consumes connector events on one task, applies them
//! through the [`lifecycle`](crate::lifecycle) rules, keeps the latest pairing
//! code, drives the readiness gate, and reconnects according to the
//! configured [`ReconnectPolicy`](crate::ReconnectPolicy).
//!
//! The HTTP layer only reads from the supervisor and calls
//! [`send`](SessionSupervisor::send); it never changes lifecycle state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pairlink_core::{ChatId, Destination, LifecycleEvent, MessageId, PairingCode, SessionState};
use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::connector::{EventReceiver, SessionConnector};
use crate::display;
use crate::error::{Result, SessionError};
use crate::lifecycle;
use crate::readiness::ReadinessGate;
use crate::types::SessionConfig;

/// Current state plus the time it was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSnapshot {
    /// The lifecycle state.
    pub state: SessionState,
    /// When the session entered this state.
    pub since: DateTime<Utc>,
}

/// Owns the external session and its lifecycle.
pub struct SessionSupervisor<C: SessionConnector> {
    connector: Arc<C>,
    config: SessionConfig,
    state: RwLock<StateSnapshot>,
    pairing_code: RwLock<Option<PairingCode>>,
    gate: ReadinessGate,
    stop: watch::Sender<bool>,
}

impl<C: SessionConnector + 'static> SessionSupervisor<C> {
    /// Create a supervisor in the `Unpaired` state.
    ///
    /// Nothing happens until [`spawn`](Self::spawn) starts the event loop.
    #[must_use]
    pub fn new(connector: Arc<C>, config: SessionConfig) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            connector,
            config,
            state: RwLock::new(StateSnapshot {
                state: SessionState::Unpaired,
                since: Utc::now(),
            }),
            pairing_code: RwLock::new(None),
            gate: ReadinessGate::new(),
            stop,
        }
    }

    /// Start the event loop.
    ///
    /// The loop issues the initial `connect()` itself, so callers can start
    /// serving HTTP immediately. It runs until [`shutdown`](Self::shutdown)
    /// or until the connector drops its event sender.
    pub fn spawn(self: &Arc<Self>, events: EventReceiver) -> JoinHandle<()> {
        let supervisor = Arc::clone(self);
        tokio::spawn(async move { supervisor.run(events).await })
    }

    /// Get the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.read().state
    }

    /// Get the current state and when it was entered.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        *self.state.read()
    }

    /// Get the pairing code waiting to be scanned, if any.
    ///
    /// Cleared once the session authenticates and whenever a new session
    /// starts.
    #[must_use]
    pub fn pairing_code(&self) -> Option<PairingCode> {
        self.pairing_code.read().clone()
    }

    /// Whether outbound sends are currently accepted.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// Get the readiness gate.
    #[must_use]
    pub fn readiness(&self) -> &ReadinessGate {
        &self.gate
    }

    /// Get the underlying connector.
    #[must_use]
    pub fn connector(&self) -> &Arc<C> {
        &self.connector
    }

    /// Send a message through the connector.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotReady` without touching the connector if the
    /// session is not ready, or the connector's error if delivery fails.
    pub async fn send(&self, destination: &Destination, body: &str) -> Result<MessageId> {
        if !self.gate.is_ready() {
            return Err(SessionError::NotReady(self.state()));
        }

        let chat_id = ChatId::from(destination);
        tracing::debug!(chat_id = %chat_id, body_len = body.len(), "Sending message");
        self.connector.send(&chat_id, body).await
    }

    /// Close the readiness gate and stop reconnecting.
    ///
    /// Idempotent. Does not touch the connector.
    pub fn begin_shutdown(&self) {
        self.gate.close();
        self.stop.send_replace(true);
    }

    /// Stop the supervisor and destroy the external session.
    ///
    /// # Errors
    ///
    /// Returns the connector's error if `destroy()` fails.
    pub async fn shutdown(&self) -> Result<()> {
        self.begin_shutdown();
        tracing::info!("Destroying messaging session");
        self.connector.destroy().await
    }

    async fn run(self: Arc<Self>, mut events: EventReceiver) {
        let mut stop = self.stop.subscribe();
        let mut attempt: u32 = 0;

        tracing::info!("Initializing messaging session");
        let mut reconnect_at = self.start_session(&mut attempt).await;

        loop {
            if *stop.borrow_and_update() {
                break;
            }
            let deadline = reconnect_at.unwrap_or_else(Instant::now);

            tokio::select! {
                biased;

                _ = stop.changed() => continue,

                event = events.recv() => {
                    let Some(event) = event else {
                        tracing::warn!("Connector event channel closed");
                        break;
                    };
                    let reconnect = lifecycle::schedules_reconnect(&event);
                    match self.apply_event(event) {
                        Some(SessionState::Ready) => {
                            attempt = 0;
                            reconnect_at = None;
                        }
                        Some(_) if reconnect && reconnect_at.is_none() => {
                            reconnect_at = self.schedule_reconnect(&mut attempt);
                        }
                        _ => {}
                    }
                }

                () = tokio::time::sleep_until(deadline), if reconnect_at.is_some() => {
                    reconnect_at = None;
                    if lifecycle::can_reconnect(self.state()) {
                        tracing::info!(attempt, "Re-initializing messaging session");
                        reconnect_at = self.start_session(&mut attempt).await;
                    } else {
                        tracing::debug!(state = %self.state(), "Session recovered; skipping reconnect");
                    }
                }
            }
        }

        tracing::debug!("Session supervisor stopped");
    }

    /// Begin a fresh session: reset to `Unpaired`, drop the old pairing
    /// code, and call `connect()`. Returns the next reconnect deadline if the
    /// attempt failed.
    async fn start_session(&self, attempt: &mut u32) -> Option<Instant> {
        if self.gate.is_closed() {
            return None;
        }

        *self.pairing_code.write() = None;
        self.set_state(SessionState::Unpaired);

        let timeout = self.config.connect_timeout();
        let result = match tokio::time::timeout(timeout, self.connector.connect()).await {
            Ok(result) => result,
            Err(_) => Err(SessionError::Timeout {
                operation: "connect",
                after: timeout,
            }),
        };

        match result {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize messaging session");
                self.set_state(SessionState::Disconnected);
                self.schedule_reconnect(attempt)
            }
        }
    }

    fn schedule_reconnect(&self, attempt: &mut u32) -> Option<Instant> {
        if self.gate.is_closed() {
            return None;
        }

        match self.config.reconnect.delay(*attempt) {
            Some(delay) => {
                *attempt = attempt.saturating_add(1);
                tracing::info!(delay = ?delay, attempt = *attempt, "Reconnect scheduled");
                Some(Instant::now() + delay)
            }
            None => {
                tracing::error!(
                    attempts = *attempt,
                    "Reconnect attempts exhausted; session stays disconnected"
                );
                None
            }
        }
    }

    /// Apply one event. Returns the new state, or `None` if the event did not
    /// apply in the current state.
    fn apply_event(&self, event: LifecycleEvent) -> Option<SessionState> {
        let from = self.state();
        let Some(to) = lifecycle::next_state(from, &event) else {
            tracing::warn!(event = event.name(), state = %from, "Ignoring lifecycle event");
            return None;
        };

        if to == SessionState::Ready && self.gate.is_closed() {
            tracing::debug!("Ignoring ready event during shutdown");
            return None;
        }

        match event {
            LifecycleEvent::PairingCode(code) => {
                tracing::info!(
                    code_len = code.len(),
                    "Pairing code received; scan it with the companion app"
                );
                if self.config.print_pairing_code {
                    display::print_pairing_code(&code);
                }
                *self.pairing_code.write() = Some(code);
            }
            LifecycleEvent::Authenticated => {
                tracing::info!("Session authenticated");
            }
            LifecycleEvent::AuthFailed { message } => {
                tracing::error!(
                    error = %message,
                    "Session authentication failed; stored credentials may be corrupt"
                );
            }
            LifecycleEvent::Ready => {
                tracing::info!("Session ready; accepting outbound messages");
            }
            LifecycleEvent::Disconnected { reason } => {
                tracing::warn!(reason = %reason, "Session disconnected");
            }
        }

        // A code is only useful until the companion app has scanned it.
        if matches!(to, SessionState::Authenticated | SessionState::Ready) {
            *self.pairing_code.write() = None;
        }

        self.set_state(to);
        Some(to)
    }

    fn set_state(&self, to: SessionState) {
        let mut state = self.state.write();
        if state.state != to {
            tracing::debug!(from = %state.state, to = %to, "Session state changed");
            *state = StateSnapshot {
                state: to,
                since: Utc::now(),
            };
        }
        self.gate.set_ready(lifecycle::accepts_sends(to));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::testing::FakeConnector;
    use crate::types::ReconnectPolicy;

    fn slow_reconnect() -> SessionConfig {
        SessionConfig {
            connect_timeout_seconds: 5,
            reconnect: ReconnectPolicy::Backoff {
                initial_ms: 60_000,
                max_ms: 60_000,
                multiplier: 1,
                max_attempts: None,
            },
            print_pairing_code: false,
        }
    }

    fn start(
        config: SessionConfig,
    ) -> (Arc<SessionSupervisor<FakeConnector>>, Arc<FakeConnector>) {
        let (fake, events) = FakeConnector::new();
        let fake = Arc::new(fake);
        let supervisor = Arc::new(SessionSupervisor::new(Arc::clone(&fake), config));
        supervisor.spawn(events);
        (supervisor, fake)
    }

    async fn wait_until<F: Fn() -> bool>(condition: F) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    fn code(s: &str) -> LifecycleEvent {
        LifecycleEvent::PairingCode(PairingCode::new(s))
    }

    fn disconnected() -> LifecycleEvent {
        LifecycleEvent::Disconnected {
            reason: "LOGOUT".into(),
        }
    }

    #[tokio::test]
    async fn connects_on_start() {
        let (supervisor, fake) = start(slow_reconnect());
        wait_until(|| fake.connect_count() == 1).await;
        assert_eq!(supervisor.state(), SessionState::Unpaired);
        assert!(!supervisor.is_ready());
        assert!(supervisor.pairing_code().is_none());
    }

    #[tokio::test]
    async fn pairing_flow_reaches_ready() {
        let (supervisor, fake) = start(slow_reconnect());

        fake.emit(code("2@first"));
        wait_until(|| supervisor.state() == SessionState::PairingPending).await;
        assert_eq!(supervisor.pairing_code().unwrap().as_str(), "2@first");

        fake.emit(code("2@second"));
        wait_until(|| {
            supervisor
                .pairing_code()
                .is_some_and(|c| c.as_str() == "2@second")
        })
        .await;

        fake.emit(LifecycleEvent::Authenticated);
        wait_until(|| supervisor.state() == SessionState::Authenticated).await;
        assert!(supervisor.pairing_code().is_none());

        fake.emit(LifecycleEvent::Ready);
        wait_until(|| supervisor.is_ready()).await;
        assert_eq!(supervisor.state(), SessionState::Ready);
        assert!(supervisor.pairing_code().is_none());
    }

    #[tokio::test]
    async fn ready_straight_from_pairing_clears_code() {
        let (supervisor, fake) = start(slow_reconnect());

        fake.emit(code("2@used"));
        fake.emit(LifecycleEvent::Ready);
        wait_until(|| supervisor.is_ready()).await;

        assert!(supervisor.pairing_code().is_none());
    }

    #[tokio::test]
    async fn disconnect_clears_readiness_until_next_ready() {
        let (supervisor, fake) = start(slow_reconnect());

        fake.emit(LifecycleEvent::Authenticated);
        fake.emit(LifecycleEvent::Ready);
        wait_until(|| supervisor.is_ready()).await;

        fake.emit(disconnected());
        wait_until(|| supervisor.state() == SessionState::Disconnected).await;
        assert!(!supervisor.is_ready());

        fake.emit(LifecycleEvent::Ready);
        wait_until(|| supervisor.is_ready()).await;
    }

    #[tokio::test]
    async fn auth_failure_keeps_pairing_code_and_does_not_reconnect() {
        let (supervisor, fake) = start(ReconnectPolicy::Immediate.into());

        fake.emit(code("2@keep"));
        fake.emit(LifecycleEvent::AuthFailed {
            message: "corrupt".into(),
        });
        wait_until(|| supervisor.state() == SessionState::Disconnected).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fake.connect_count(), 1);
        assert_eq!(supervisor.pairing_code().unwrap().as_str(), "2@keep");
    }

    #[tokio::test]
    async fn disconnect_triggers_reconnect_and_clears_code() {
        let (supervisor, fake) = start(ReconnectPolicy::Immediate.into());
        wait_until(|| fake.connect_count() == 1).await;

        fake.emit(code("2@stale"));
        fake.emit(disconnected());

        wait_until(|| fake.connect_count() == 2).await;
        wait_until(|| supervisor.state() == SessionState::Unpaired).await;
        assert!(supervisor.pairing_code().is_none());
    }

    #[tokio::test]
    async fn failed_connects_retry_until_budget_spent() {
        let (fake, events) = FakeConnector::new();
        fake.fail_connect(true);
        let fake = Arc::new(fake);
        let config = SessionConfig {
            connect_timeout_seconds: 5,
            reconnect: ReconnectPolicy::Backoff {
                initial_ms: 5,
                max_ms: 5,
                multiplier: 1,
                max_attempts: Some(3),
            },
            print_pairing_code: false,
        };
        let supervisor = Arc::new(SessionSupervisor::new(Arc::clone(&fake), config));
        supervisor.spawn(events);

        // One initial attempt plus three retries.
        wait_until(|| fake.connect_count() == 4).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fake.connect_count(), 4);
        assert_eq!(supervisor.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn send_rejected_when_not_ready() {
        let (supervisor, fake) = start(slow_reconnect());
        let destination: Destination = "6281234567890".parse().unwrap();

        let result = supervisor.send(&destination, "Hello").await;
        assert!(matches!(
            result,
            Err(SessionError::NotReady(SessionState::Unpaired))
        ));
        assert!(fake.sent().is_empty());
    }

    #[tokio::test]
    async fn send_builds_chat_id_when_ready() {
        let (supervisor, fake) = start(slow_reconnect());
        fake.emit(LifecycleEvent::Authenticated);
        fake.emit(LifecycleEvent::Ready);
        wait_until(|| supervisor.is_ready()).await;

        let destination: Destination = "6281234567890".parse().unwrap();
        let id = supervisor.send(&destination, "Hello").await.unwrap();

        assert!(!id.as_str().is_empty());
        let sent = fake.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.as_str(), "6281234567890@c.us");
        assert_eq!(sent[0].1, "Hello");
    }

    #[tokio::test]
    async fn shutdown_closes_gate_and_destroys() {
        let (supervisor, fake) = start(slow_reconnect());
        fake.emit(LifecycleEvent::Authenticated);
        fake.emit(LifecycleEvent::Ready);
        wait_until(|| supervisor.is_ready()).await;

        supervisor.shutdown().await.unwrap();
        assert!(!supervisor.is_ready());
        assert_eq!(fake.destroy_count(), 1);

        // A late ready event cannot reopen the gate.
        fake.emit(LifecycleEvent::Ready);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!supervisor.is_ready());
    }

    #[tokio::test]
    async fn snapshot_tracks_transition_time() {
        let (supervisor, fake) = start(slow_reconnect());
        let before = supervisor.snapshot().since;

        tokio::time::sleep(Duration::from_millis(5)).await;
        fake.emit(code("2@t"));
        wait_until(|| supervisor.state() == SessionState::PairingPending).await;

        assert!(supervisor.snapshot().since >= before);
    }
}
