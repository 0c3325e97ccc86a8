//! In-memory connector for tests.
//!
//! `FakeConnector` records every call, lets tests push lifecycle events as if
//! the engine had emitted them, and can be told to fail or stall.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use pairlink_core::{ChatId, LifecycleEvent, MessageId};
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::connector::{event_channel, EventReceiver, EventSender, SessionConnector};
use crate::error::{Result, SessionError};

/// A scriptable [`SessionConnector`] that never leaves the process.
#[derive(Debug)]
pub struct FakeConnector {
    events: EventSender,
    connects: AtomicUsize,
    destroys: AtomicUsize,
    sent: Mutex<Vec<(ChatId, String)>>,
    fail_connect: AtomicBool,
    send_error: Mutex<Option<String>>,
    hold_sends: AtomicBool,
    send_entered: Notify,
    send_release: Notify,
    hang_destroy: AtomicBool,
}

impl FakeConnector {
    /// Create a fake connector and the receiving end of its event channel.
    #[must_use]
    pub fn new() -> (Self, EventReceiver) {
        let (events, rx) = event_channel();
        let connector = Self {
            events,
            connects: AtomicUsize::new(0),
            destroys: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            fail_connect: AtomicBool::new(false),
            send_error: Mutex::new(None),
            hold_sends: AtomicBool::new(false),
            send_entered: Notify::new(),
            send_release: Notify::new(),
            hang_destroy: AtomicBool::new(false),
        };
        (connector, rx)
    }

    /// Emit a lifecycle event as if the engine had sent it.
    pub fn emit(&self, event: LifecycleEvent) {
        let _ = self.events.send(event);
    }

    /// Make subsequent `connect()` calls fail.
    pub fn fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `send()` calls fail with `detail`, or succeed with `None`.
    pub fn fail_sends(&self, detail: Option<&str>) {
        *self.send_error.lock() = detail.map(str::to_string);
    }

    /// Park each `send()` until [`release_send`](Self::release_send) is called.
    pub fn hold_sends(&self, hold: bool) {
        self.hold_sends.store(hold, Ordering::SeqCst);
    }

    /// Wait until a held `send()` has started.
    pub async fn send_started(&self) {
        self.send_entered.notified().await;
    }

    /// Let one held `send()` finish.
    pub fn release_send(&self) {
        self.send_release.notify_one();
    }

    /// Make `destroy()` never complete.
    pub fn hang_destroy(&self, hang: bool) {
        self.hang_destroy.store(hang, Ordering::SeqCst);
    }

    /// Number of `connect()` calls so far.
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Number of `destroy()` calls so far.
    #[must_use]
    pub fn destroy_count(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }

    /// Messages passed to `send()`, in call order.
    #[must_use]
    pub fn sent(&self) -> Vec<(ChatId, String)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl SessionConnector for FakeConnector {
    async fn connect(&self) -> Result<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(SessionError::Connect("fake engine unavailable".to_string()));
        }
        Ok(())
    }

    async fn send(&self, chat_id: &ChatId, body: &str) -> Result<MessageId> {
        if self.hold_sends.load(Ordering::SeqCst) {
            self.send_entered.notify_one();
            self.send_release.notified().await;
        }

        let error = self.send_error.lock().clone();
        if let Some(detail) = error {
            return Err(SessionError::Send(detail));
        }

        let mut sent = self.sent.lock();
        sent.push((chat_id.clone(), body.to_string()));
        Ok(MessageId::new(format!("fake_{}_{}", chat_id, sent.len())))
    }

    async fn destroy(&self) -> Result<()> {
        self.destroys.fetch_add(1, Ordering::SeqCst);
        if self.hang_destroy.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}
