//! Gateway application state.
//!
//! This module defines the shared state that is available to all request handlers.

use std::sync::Arc;

use pairlink_session::{SessionConnector, SessionSupervisor};

use crate::auth::SecretKey;
use crate::config::GatewayConfig;

/// Shared application state for the gateway.
pub struct GatewayState<C>
where
    C: SessionConnector,
{
    /// The messaging session handlers read from and send through.
    pub session: Arc<SessionSupervisor<C>>,
    /// Gateway configuration.
    pub config: GatewayConfig,
    /// Digest of the configured shared secret, if any.
    pub secret: Option<SecretKey>,
}

impl<C> GatewayState<C>
where
    C: SessionConnector,
{
    /// Create a new gateway state.
    #[must_use]
    pub fn new(session: Arc<SessionSupervisor<C>>, config: GatewayConfig) -> Self {
        let secret = config.secret_key.as_deref().and_then(SecretKey::new);
        Self {
            session,
            config,
            secret,
        }
    }
}

impl<C> Clone for GatewayState<C>
where
    C: SessionConnector,
{
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            config: self.config.clone(),
            secret: self.secret.clone(),
        }
    }
}
