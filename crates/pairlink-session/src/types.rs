//! Configuration types for session management.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the supervisor retries after the session drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconnectPolicy {
    /// Reconnect straight away, forever.
    Immediate,
    /// Exponential backoff between attempts.
    Backoff {
        /// Delay before the first attempt, in milliseconds.
        initial_ms: u64,
        /// Upper bound on any single delay, in milliseconds.
        max_ms: u64,
        /// Growth factor applied per attempt.
        multiplier: u32,
        /// Give up after this many consecutive failed attempts.
        #[serde(default)]
        max_attempts: Option<u32>,
    },
}

impl ReconnectPolicy {
    /// Parse a policy name as used in the `RECONNECT_POLICY` variable.
    ///
    /// Returns `None` for unknown names.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "immediate" => Some(Self::Immediate),
            "backoff" | "exponential" => Some(Self::default()),
            _ => None,
        }
    }

    /// Delay before reconnect attempt number `attempt` (zero-based), or
    /// `None` once the attempt budget is spent.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        match *self {
            Self::Immediate => Some(Duration::ZERO),
            Self::Backoff {
                initial_ms,
                max_ms,
                multiplier,
                max_attempts,
            } => {
                if max_attempts.is_some_and(|max| attempt >= max) {
                    return None;
                }
                let factor = u64::from(multiplier).saturating_pow(attempt);
                let ms = initial_ms.saturating_mul(factor).min(max_ms);
                Some(Duration::from_millis(ms))
            }
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::Backoff {
            initial_ms: 1_000,
            max_ms: 60_000,
            multiplier: 2,
            max_attempts: None,
        }
    }
}

/// Configuration for the session supervisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long a single `connect()` may take, in seconds.
    #[serde(default = "SessionConfig::default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Retry behaviour after a disconnect or a failed connect.
    #[serde(default)]
    pub reconnect: ReconnectPolicy,

    /// Draw each pairing code as a QR code on stdout.
    #[serde(default = "SessionConfig::default_print_pairing_code")]
    pub print_pairing_code: bool,
}

impl SessionConfig {
    const fn default_connect_timeout() -> u64 {
        60
    }

    const fn default_print_pairing_code() -> bool {
        true
    }

    /// Get the connect timeout as a `Duration`.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_seconds: Self::default_connect_timeout(),
            reconnect: ReconnectPolicy::default(),
            print_pairing_code: Self::default_print_pairing_code(),
        }
    }
}

impl From<ReconnectPolicy> for SessionConfig {
    fn from(reconnect: ReconnectPolicy) -> Self {
        Self {
            reconnect,
            ..Self::default()
        }
    }
}
