//! Session connector abstraction.
//!
//! A connector wraps the external messaging engine. It owns the single
//! external session, exposes the three commands below, and reports lifecycle
//! changes by pushing [`LifecycleEvent`]s into the [`EventSender`] it was
//! constructed with.

use async_trait::async_trait;
use pairlink_core::{ChatId, LifecycleEvent, MessageId};
use tokio::sync::mpsc;

use crate::error::Result;

/// Sending half of the lifecycle event channel, held by the connector.
pub type EventSender = mpsc::UnboundedSender<LifecycleEvent>;

/// Receiving half of the lifecycle event channel, consumed by the supervisor.
pub type EventReceiver = mpsc::UnboundedReceiver<LifecycleEvent>;

/// Create the channel a connector uses to report lifecycle events.
///
/// Events are delivered in emission order.
#[must_use]
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Trait for the external messaging session.
///
/// This trait abstracts the messaging engine, allowing for fake
/// implementations in tests.
#[async_trait]
pub trait SessionConnector: Send + Sync {
    /// Start (or restart) the external session.
    ///
    /// Completion only means the engine accepted the request; progress is
    /// reported through lifecycle events.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine could not be reached or refused.
    async fn connect(&self) -> Result<()>;

    /// Send a text message to a chat.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine failed to deliver the message.
    async fn send(&self, chat_id: &ChatId, body: &str) -> Result<MessageId>;

    /// Tear down the external session and release its resources.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine could not be shut down cleanly.
    async fn destroy(&self) -> Result<()>;
}
