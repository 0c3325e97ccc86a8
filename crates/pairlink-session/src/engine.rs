//! Connector for an HTTP/WebSocket messaging-engine sidecar.
//!
//! The engine runs the actual messaging client (browser automation, stored
//! credentials) and exposes a small bridge API:
//!
//! - `POST /v1/session/start` starts or restarts the session
//! - `GET  /v1/session/events` (WebSocket) streams lifecycle events as JSON
//! - `POST /v1/messages` sends a message, returning its ID
//! - `POST /v1/session/destroy` tears the session down

use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use pairlink_core::{ChatId, LifecycleEvent, MessageId, PairingCode};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::connector::{EventSender, SessionConnector};
use crate::error::{Result, SessionError};

/// Configuration for the engine bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the engine (e.g., "http://engine:8090").
    pub base_url: String,

    /// Timeout for individual HTTP commands, in seconds.
    #[serde(default = "EngineConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl EngineConfig {
    const fn default_request_timeout() -> u64 {
        30
    }

    /// Create a configuration for the given base URL with default timeouts.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// URL of the WebSocket event stream.
    #[must_use]
    pub fn events_url(&self) -> String {
        let base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };
        format!("{base}/v1/session/events")
    }
}

/// Session connector backed by the engine bridge.
pub struct EngineConnector {
    client: reqwest::Client,
    config: EngineConfig,
    events: EventSender,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl EngineConnector {
    /// Create a connector that reports lifecycle events into `events`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Internal` if the HTTP client cannot be built.
    pub fn new(config: EngineConfig, events: EventSender) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| SessionError::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            events,
            listener: Mutex::new(None),
        })
    }

    /// Get the engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn stop_listener(&self) {
        if let Some(handle) = self.listener.lock().take() {
            handle.abort();
        }
    }

    async fn post<B>(&self, path: &str, body: &B) -> std::result::Result<reqwest::Response, String>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = format!("{}{path}", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("engine request failed: {e}"))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let error = response
            .json::<ErrorResponse>()
            .await
            .map(|e| e.error)
            .unwrap_or_else(|_| format!("engine returned status {status}"));

        tracing::error!(
            path = %path,
            status = %status,
            error = %error,
            "Engine command failed"
        );

        Err(format!("engine error: {error}"))
    }
}

impl Drop for EngineConnector {
    fn drop(&mut self) {
        self.stop_listener();
    }
}

/// Request body for sending a message.
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    chat_id: &'a str,
    body: &'a str,
}

/// Response body for a sent message.
#[derive(Debug, Deserialize)]
struct SendResponse {
    message_id: MessageId,
}

/// Error response from the engine.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// A frame on the engine's event stream.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum EngineEvent {
    Qr {
        code: String,
    },
    Authenticated,
    AuthFailure {
        #[serde(default)]
        message: String,
    },
    Ready,
    Disconnected {
        #[serde(default)]
        reason: String,
    },
}

impl From<EngineEvent> for LifecycleEvent {
    fn from(event: EngineEvent) -> Self {
        match event {
            EngineEvent::Qr { code } => Self::PairingCode(PairingCode::new(code)),
            EngineEvent::Authenticated => Self::Authenticated,
            EngineEvent::AuthFailure { message } => Self::AuthFailed { message },
            EngineEvent::Ready => Self::Ready,
            EngineEvent::Disconnected { reason } => Self::Disconnected { reason },
        }
    }
}

/// Forward engine frames into the lifecycle channel until the stream ends.
///
/// If the stream ends without the engine reporting a disconnect, one is
/// synthesized so the supervisor can reconnect.
async fn pump_events<S, E>(mut stream: S, events: &EventSender)
where
    S: Stream<Item = std::result::Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(error = %e, "Engine event stream failed");
                break;
            }
        };

        let event = match serde_json::from_str::<EngineEvent>(&text) {
            Ok(event) => LifecycleEvent::from(event),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unrecognised engine frame");
                continue;
            }
        };

        let terminal = matches!(event, LifecycleEvent::Disconnected { .. });
        if events.send(event).is_err() || terminal {
            return;
        }
    }

    let _ = events.send(LifecycleEvent::Disconnected {
        reason: "engine event stream closed".to_string(),
    });
}

#[async_trait]
impl SessionConnector for EngineConnector {
    async fn connect(&self) -> Result<()> {
        self.stop_listener();

        // Subscribe before starting so no early event is missed.
        let url = self.config.events_url();
        let (stream, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| SessionError::Connect(format!("event stream {url}: {e}")))?;

        self.post("/v1/session/start", &serde_json::json!({}))
            .await
            .map_err(SessionError::Connect)?;

        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            pump_events(stream, &events).await;
        });
        *self.listener.lock() = Some(handle);

        tracing::debug!(engine = %self.config.base_url, "Engine session started");
        Ok(())
    }

    async fn send(&self, chat_id: &ChatId, body: &str) -> Result<MessageId> {
        let request = SendRequest {
            chat_id: chat_id.as_str(),
            body,
        };

        let response = self
            .post("/v1/messages", &request)
            .await
            .map_err(SessionError::Send)?;

        let sent: SendResponse = response
            .json()
            .await
            .map_err(|e| SessionError::Send(format!("failed to parse engine response: {e}")))?;

        Ok(sent.message_id)
    }

    async fn destroy(&self) -> Result<()> {
        self.stop_listener();

        self.post("/v1/session/destroy", &serde_json::json!({}))
            .await
            .map_err(SessionError::Destroy)?;

        tracing::debug!(engine = %self.config.base_url, "Engine session destroyed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::event_channel;
    use pairlink_core::Destination;
    use serde_json::json;
    use tokio_tungstenite::tungstenite;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn text(s: &str) -> std::result::Result<Message, tungstenite::Error> {
        Ok(Message::Text(s.to_string()))
    }

    #[test]
    fn events_url_uses_websocket_scheme() {
        assert_eq!(
            EngineConfig::new("http://engine:8090/").events_url(),
            "ws://engine:8090/v1/session/events"
        );
        assert_eq!(
            EngineConfig::new("https://engine.internal").events_url(),
            "wss://engine.internal/v1/session/events"
        );
    }

    #[test]
    fn engine_frames_map_to_lifecycle_events() {
        let event: EngineEvent = serde_json::from_str(r#"{"type":"qr","code":"2@xyz"}"#).unwrap();
        assert_eq!(
            LifecycleEvent::from(event),
            LifecycleEvent::PairingCode(PairingCode::new("2@xyz"))
        );

        let event: EngineEvent =
            serde_json::from_str(r#"{"type":"auth_failure","message":"bad"}"#).unwrap();
        assert_eq!(
            LifecycleEvent::from(event),
            LifecycleEvent::AuthFailed {
                message: "bad".into()
            }
        );

        let event: EngineEvent = serde_json::from_str(r#"{"type":"disconnected"}"#).unwrap();
        assert_eq!(
            LifecycleEvent::from(event),
            LifecycleEvent::Disconnected {
                reason: String::new()
            }
        );
    }

    #[tokio::test]
    async fn pump_forwards_frames_then_reports_closed_stream() {
        let (tx, mut rx) = event_channel();
        let frames = futures::stream::iter(vec![
            text(r#"{"type":"qr","code":"2@abc"}"#),
            Ok(Message::Ping(vec![1])),
            text("not json"),
            text(r#"{"type":"loading_screen","percent":40}"#),
            text(r#"{"type":"authenticated"}"#),
            text(r#"{"type":"ready"}"#),
        ]);

        pump_events(frames, &tx).await;

        assert_eq!(rx.recv().await.unwrap().name(), "pairing-code");
        assert_eq!(rx.recv().await.unwrap(), LifecycleEvent::Authenticated);
        assert_eq!(rx.recv().await.unwrap(), LifecycleEvent::Ready);
        assert_eq!(
            rx.recv().await.unwrap(),
            LifecycleEvent::Disconnected {
                reason: "engine event stream closed".into()
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn pump_does_not_duplicate_engine_disconnect() {
        let (tx, mut rx) = event_channel();
        let frames = futures::stream::iter(vec![
            text(r#"{"type":"disconnected","reason":"LOGOUT"}"#),
            text(r#"{"type":"ready"}"#),
        ]);

        pump_events(frames, &tx).await;

        assert_eq!(
            rx.recv().await.unwrap(),
            LifecycleEvent::Disconnected {
                reason: "LOGOUT".into()
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_posts_chat_id_and_returns_message_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(body_json(json!({
                "chat_id": "6281234567890@c.us",
                "body": "Hello"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "message_id": "true_ABC123" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (tx, _rx) = event_channel();
        let connector = EngineConnector::new(EngineConfig::new(server.uri()), tx).unwrap();
        let destination: Destination = "6281234567890".parse().unwrap();
        let chat_id = ChatId::from(&destination);

        let id = connector.send(&chat_id, "Hello").await.unwrap();
        assert_eq!(id.as_str(), "true_ABC123");
    }

    #[tokio::test]
    async fn send_surfaces_engine_error_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({ "error": "chat not found" })),
            )
            .mount(&server)
            .await;

        let (tx, _rx) = event_channel();
        let connector = EngineConnector::new(EngineConfig::new(server.uri()), tx).unwrap();
        let destination: Destination = "123".parse().unwrap();
        let chat_id = ChatId::from(&destination);

        match connector.send(&chat_id, "hi").await {
            Err(SessionError::Send(detail)) => assert!(detail.contains("chat not found")),
            other => panic!("expected send error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn destroy_posts_to_engine() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/session/destroy"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let (tx, _rx) = event_channel();
        let connector = EngineConnector::new(EngineConfig::new(server.uri()), tx).unwrap();
        connector.destroy().await.unwrap();
    }

    #[tokio::test]
    async fn connect_fails_without_event_stream() {
        // A plain HTTP server refuses the WebSocket upgrade.
        let server = MockServer::start().await;

        let (tx, _rx) = event_channel();
        let connector = EngineConnector::new(EngineConfig::new(server.uri()), tx).unwrap();

        assert!(matches!(
            connector.connect().await,
            Err(SessionError::Connect(_))
        ));
    }
}
