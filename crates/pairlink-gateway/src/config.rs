//! Gateway configuration types.
//!
//! Values come from the process environment. Anything unset or unparseable
//! falls back to a default so the gateway always starts.

use std::time::Duration;

use serde::Deserialize;

use pairlink_session::{ReconnectPolicy, SessionConfig};

/// Configuration for the gateway service.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Interface to bind.
    #[serde(default = "GatewayConfig::default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "GatewayConfig::default_port")]
    pub port: u16,

    /// Shared secret for protected routes. `None` rejects every protected request.
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Directory holding the bundled front-end.
    #[serde(default = "GatewayConfig::default_static_dir")]
    pub static_dir: String,

    /// Base URL of the messaging engine bridge.
    #[serde(default = "GatewayConfig::default_engine_url")]
    pub engine_url: String,

    /// Allowed CORS origins.
    #[serde(default = "GatewayConfig::default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    #[serde(default = "GatewayConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    #[serde(default = "GatewayConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Hard budget for the whole shutdown sequence, in seconds.
    #[serde(default = "GatewayConfig::default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,

    /// Session supervisor settings.
    #[serde(default)]
    pub session: SessionConfig,
}

impl GatewayConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    const fn default_port() -> u16 {
        3000
    }

    fn default_static_dir() -> String {
        "frontend".to_string()
    }

    fn default_engine_url() -> String {
        "http://127.0.0.1:8090".to_string()
    }

    fn default_cors_origins() -> Vec<String> {
        vec!["*".to_string()]
    }

    const fn default_max_body() -> usize {
        1024 * 1024 // 1 MB
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    const fn default_shutdown_timeout() -> u64 {
        10
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `HOST` | `0.0.0.0` |
    /// | `PORT` | `3000` |
    /// | `SECRET_KEY` | unset |
    /// | `STATIC_DIR` | `frontend` |
    /// | `ENGINE_URL` | `http://127.0.0.1:8090` |
    /// | `CORS_ORIGINS` | `*` (comma separated) |
    /// | `SHUTDOWN_TIMEOUT_SECONDS` | `10` |
    /// | `CONNECT_TIMEOUT_SECONDS` | `60` |
    /// | `RECONNECT_POLICY` | `backoff` (or `immediate`) |
    /// | `PRINT_PAIRING_QR` | `true` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST").filter(|v| !v.trim().is_empty()) {
            config.host = host;
        }
        if let Some(port) = parsed(&lookup, "PORT") {
            config.port = port;
        }
        config.secret_key = lookup("SECRET_KEY").filter(|v| !v.is_empty());
        if let Some(dir) = lookup("STATIC_DIR").filter(|v| !v.trim().is_empty()) {
            config.static_dir = dir;
        }
        if let Some(url) = lookup("ENGINE_URL").filter(|v| !v.trim().is_empty()) {
            config.engine_url = url;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            let origins: Vec<String> = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
            if !origins.is_empty() {
                config.cors_origins = origins;
            }
        }
        if let Some(seconds) = parsed(&lookup, "SHUTDOWN_TIMEOUT_SECONDS") {
            config.shutdown_timeout_seconds = seconds;
        }
        if let Some(seconds) = parsed(&lookup, "CONNECT_TIMEOUT_SECONDS") {
            config.session.connect_timeout_seconds = seconds;
        }
        if let Some(print) = parsed(&lookup, "PRINT_PAIRING_QR") {
            config.session.print_pairing_code = print;
        }
        if let Some(name) = lookup("RECONNECT_POLICY") {
            match ReconnectPolicy::from_name(&name) {
                Some(policy) => config.session.reconnect = policy,
                None => tracing::warn!(value = %name, "Unknown RECONNECT_POLICY, using default"),
            }
        }

        config
    }

    /// Socket address string to bind, e.g. `0.0.0.0:3000`.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Get the shutdown budget as a `Duration`.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

fn parsed<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable environment value");
            None
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            secret_key: None,
            static_dir: Self::default_static_dir(),
            engine_url: Self::default_engine_url(),
            cors_origins: Self::default_cors_origins(),
            max_body_bytes: Self::default_max_body(),
            request_timeout_seconds: Self::default_request_timeout(),
            shutdown_timeout_seconds: Self::default_shutdown_timeout(),
            session: SessionConfig::default(),
        }
    }
}
