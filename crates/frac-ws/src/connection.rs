//! WebSocket connection manager.
//!
//! Handles the connection lifecycle: header-authenticated connect, an ordered
//! receive/dispatch loop, keepalive, fixed-delay reconnection and cooperative
//! shutdown through a `CancellationToken`.
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> ReconnectWait -> Connecting ...
//!        any running state --(stop)--> Stopping -> Stopped
//! ```

use crate::error::{WsError, WsResult};
use crate::handler::MessageHandler;
use crate::heartbeat::HeartbeatManager;
use crate::message::decode_frame;
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as TokioMutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderValue};
use tokio_tungstenite::{connect_async_tls_with_config, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Fixed wait between a lost connection and the next attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Path of the executor endpoint below the server base URL.
pub const EXECUTOR_PATH: &str = "/ws/executor/";

/// Upper bound for sending the Close frame during shutdown.
const CLOSE_FRAME_TIMEOUT: Duration = Duration::from_secs(1);

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;
type WsSink = futures_util::stream::SplitSink<WsStream, Message>;

/// Build the executor endpoint from a server base URL.
///
/// Trailing slashes on the base are dropped: `wss://host/` and `wss://host`
/// both yield `wss://host/ws/executor/`.
pub fn executor_endpoint(base: &str) -> String {
    format!("{}{}", base.trim().trim_end_matches('/'), EXECUTOR_PATH)
}

/// Connection configuration.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Full WebSocket URL of the executor endpoint.
    pub url: String,
    /// User token sent in the `Authorization` header.
    pub token: String,
    /// Scheme prefix of the `Authorization` header value.
    pub auth_scheme: String,
    /// Fixed delay between reconnection attempts.
    pub reconnect_delay_ms: u64,
    /// Idle time before a keepalive ping is sent.
    pub ping_interval_ms: u64,
    /// Time allowed for traffic to arrive after a ping.
    pub ping_timeout_ms: u64,
    /// Upper bound for TCP + TLS + WebSocket handshake.
    pub connect_timeout_ms: u64,
    /// Upper bound for handling one frame (0 = unbounded).
    pub dispatch_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            token: String::new(),
            auth_scheme: "Token".to_string(),
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY.as_millis() as u64,
            ping_interval_ms: 20_000,
            ping_timeout_ms: 20_000,
            connect_timeout_ms: 30_000,
            dispatch_timeout_ms: 0,
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("auth_scheme", &self.auth_scheme)
            .field("reconnect_delay_ms", &self.reconnect_delay_ms)
            .field("ping_interval_ms", &self.ping_interval_ms)
            .field("ping_timeout_ms", &self.ping_timeout_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("dispatch_timeout_ms", &self.dispatch_timeout_ms)
            .finish()
    }
}

impl ConnectionConfig {
    /// Config for the executor endpoint of `base_url`.
    ///
    /// A blank base leaves `url` empty so `validate` reports it as missing.
    pub fn new(base_url: &str, token: impl Into<String>) -> Self {
        let url = if base_url.trim().is_empty() {
            String::new()
        } else {
            executor_endpoint(base_url)
        };
        Self {
            url,
            token: token.into(),
            ..Default::default()
        }
    }

    /// Check that URL, token and timings are present and usable.
    ///
    /// Every timing must be non-zero except `dispatch_timeout_ms`, where zero
    /// means unbounded.
    pub fn validate(&self) -> WsResult<()> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(WsError::Config("server URL not set".to_string()));
        }
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(WsError::Config(format!(
                "server URL must use ws:// or wss://: {url}"
            )));
        }
        if self.token.trim().is_empty() {
            return Err(WsError::Config("user token not set".to_string()));
        }
        for (name, value) in [
            ("reconnect_delay_ms", self.reconnect_delay_ms),
            ("ping_interval_ms", self.ping_interval_ms),
            ("ping_timeout_ms", self.ping_timeout_ms),
            ("connect_timeout_ms", self.connect_timeout_ms),
        ] {
            if value == 0 {
                return Err(WsError::Config(format!("{name} must be greater than zero")));
            }
        }
        Ok(())
    }

    /// Handshake request carrying the authorization header.
    pub fn client_request(&self) -> WsResult<Request> {
        self.validate()?;

        let mut request = self
            .url
            .trim()
            .into_client_request()
            .map_err(|e| WsError::Config(format!("invalid server URL {}: {e}", self.url)))?;
        let value = HeaderValue::from_str(&format!("{} {}", self.auth_scheme, self.token.trim()))
            .map_err(|_| WsError::Config("user token is not a valid header value".to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, value);

        Ok(request)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn dispatch_timeout(&self) -> Option<Duration> {
        (self.dispatch_timeout_ms > 0).then(|| Duration::from_millis(self.dispatch_timeout_ms))
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    ReconnectWait,
    Stopping,
    Stopped,
}

impl ConnectionState {
    /// Stopping or Stopped.
    pub fn is_shutting_down(&self) -> bool {
        matches!(self, Self::Stopping | Self::Stopped)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::ReconnectWait => "reconnect_wait",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Point-in-time view of the connection for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStats {
    pub state: ConnectionState,
    pub reconnect_attempts: u32,
    pub frames_received: u64,
    pub decode_errors: u64,
    pub last_connected_at: Option<DateTime<Utc>>,
}

/// How a session on one socket ended without a transport error.
enum SessionEnd {
    /// Shutdown requested; do not reconnect.
    Shutdown,
    /// Peer ended the stream.
    StreamEnded,
}

/// WebSocket connection manager.
pub struct ConnectionManager {
    config: ConnectionConfig,
    state: RwLock<ConnectionState>,
    heartbeat: HeartbeatManager,
    handler: Arc<dyn MessageHandler>,
    /// Cancellation token for graceful shutdown.
    shutdown_token: CancellationToken,
    reconnect_attempts: AtomicU32,
    frames_received: AtomicU64,
    decode_errors: AtomicU64,
    last_connected_at: RwLock<Option<DateTime<Utc>>>,
    task: TokioMutex<Option<JoinHandle<()>>>,
}

impl ConnectionManager {
    /// Create a new connection manager.
    ///
    /// `shutdown_token` is observed at every suspension point of the loop;
    /// cancelling it from anywhere stops the manager.
    pub fn new(
        config: ConnectionConfig,
        handler: Arc<dyn MessageHandler>,
        shutdown_token: CancellationToken,
    ) -> Self {
        let heartbeat = HeartbeatManager::new(
            Duration::from_millis(config.ping_interval_ms),
            Duration::from_millis(config.ping_timeout_ms),
        );
        Self {
            config,
            state: RwLock::new(ConnectionState::Disconnected),
            heartbeat,
            handler,
            shutdown_token,
            reconnect_attempts: AtomicU32::new(0),
            frames_received: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            last_connected_at: RwLock::new(None),
            task: TokioMutex::new(None),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Get current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Check if shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    pub fn stats(&self) -> ConnectionStats {
        ConnectionStats {
            state: self.state(),
            reconnect_attempts: self.reconnect_attempts.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            last_connected_at: *self.last_connected_at.read(),
        }
    }

    /// Start the state machine in a background task and return immediately.
    ///
    /// Configuration problems are reported here, before any connection
    /// attempt. Starting an already started manager is a no-op.
    pub fn start(self: &Arc<Self>) -> WsResult<()> {
        self.config.client_request()?;

        let Ok(mut task) = self.task.try_lock() else {
            // stop() holds the lock while tearing down
            return Err(WsError::Stopped);
        };
        if task.is_some() {
            warn!("Connection manager already started");
            return Ok(());
        }
        if self.is_shutdown() || self.state().is_shutting_down() {
            return Err(WsError::Stopped);
        }

        info!(url = %self.config.url, "Starting connection manager");
        let manager = Arc::clone(self);
        *task = Some(tokio::spawn(async move { manager.run().await }));
        Ok(())
    }

    /// Request termination and wait until the loop and socket are torn down.
    ///
    /// Idempotent; safe to call before `start` or after a previous `stop`.
    pub async fn stop(&self) {
        let mut task = self.task.lock().await;

        self.transition(ConnectionState::Stopping);
        self.shutdown_token.cancel();

        if let Some(handle) = task.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "Connection task ended abnormally");
            }
        }

        self.transition(ConnectionState::Stopped);
    }

    fn transition(&self, next: ConnectionState) {
        let mut state = self.state.write();
        let current = *state;
        if current == next {
            return;
        }
        // Once shutdown began only Stopping -> Stopped is allowed.
        if current.is_shutting_down()
            && !(current == ConnectionState::Stopping && next == ConnectionState::Stopped)
        {
            debug!(from = %current, to = %next, "Ignoring state transition during shutdown");
            return;
        }
        debug!(from = %current, to = %next, "Connection state transition");
        *state = next;
    }

    async fn run(&self) {
        let delay = self.config.reconnect_delay();

        loop {
            if self.is_shutdown() {
                break;
            }

            self.transition(ConnectionState::Connecting);

            match self.run_session().await {
                Ok(SessionEnd::Shutdown) => break,
                Ok(SessionEnd::StreamEnded) => {
                    warn!("Connection closed, attempting to reconnect");
                }
                Err(e) if !self.is_shutdown() => {
                    error!(error = %e, "WebSocket connection error");
                }
                Err(_) => break,
            }

            if self.is_shutdown() {
                break;
            }

            let attempt = self.reconnect_attempts.fetch_add(1, Ordering::Relaxed) + 1;
            self.transition(ConnectionState::ReconnectWait);
            warn!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting");

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown requested during reconnect wait");
                    break;
                }
            }
        }

        self.transition(ConnectionState::Stopping);
        self.transition(ConnectionState::Stopped);
        info!("Disconnected from WebSocket server");
    }

    /// One socket lifetime: connect, then receive until close, error or shutdown.
    async fn run_session(&self) -> WsResult<SessionEnd> {
        let request = self.config.client_request()?;
        info!(url = %self.config.url, "Connecting to WebSocket server");

        let connect = tokio::time::timeout(
            self.config.connect_timeout(),
            connect_async_tls_with_config(request, None, true, None),
        );
        let (ws_stream, _response) = tokio::select! {
            biased;
            () = self.shutdown_token.cancelled() => return Ok(SessionEnd::Shutdown),
            result = connect => result
                .map_err(|_| WsError::ConnectTimeout(self.config.connect_timeout_ms))??,
        };
        let (mut write, mut read) = ws_stream.split();

        self.transition(ConnectionState::Connected);
        *self.last_connected_at.write() = Some(Utc::now());
        self.heartbeat.reset();
        info!("Connected to WebSocket server");

        loop {
            tokio::select! {
                biased;

                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received in receive loop");
                    self.transition(ConnectionState::Stopping);
                    close_quietly(&mut write).await;
                    return Ok(SessionEnd::Shutdown);
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.heartbeat.record_message();
                            if !self.process_frame(&text).await {
                                close_quietly(&mut write).await;
                                return Ok(SessionEnd::Shutdown);
                            }
                        }
                        Some(Ok(Message::Binary(bytes))) => {
                            self.heartbeat.record_message();
                            match String::from_utf8(bytes) {
                                Ok(text) => {
                                    if !self.process_frame(&text).await {
                                        close_quietly(&mut write).await;
                                        return Ok(SessionEnd::Shutdown);
                                    }
                                }
                                Err(e) => {
                                    self.frames_received.fetch_add(1, Ordering::Relaxed);
                                    self.decode_errors.fetch_add(1, Ordering::Relaxed);
                                    error!(error = %e, "Binary frame is not valid UTF-8, skipping");
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            debug!("Received ping, sending pong");
                            self.heartbeat.record_message();
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            self.heartbeat.record_pong();
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (f.code.into(), f.reason.to_string()))
                                .unwrap_or((1005, "No close frame".to_string()));
                            warn!(code, %reason, "WebSocket closed by server");
                            return Err(WsError::ConnectionClosed { code, reason });
                        }
                        Some(Ok(Message::Frame(_))) => {}
                        Some(Err(e)) => {
                            return Err(e.into());
                        }
                        None => {
                            warn!("WebSocket stream ended");
                            return Ok(SessionEnd::StreamEnded);
                        }
                    }
                }

                () = self.heartbeat.wait_for_check() => {
                    if self.heartbeat.is_timed_out() {
                        error!(
                            idle_ms = self.heartbeat.idle_for().as_millis() as u64,
                            "Keepalive timeout"
                        );
                        return Err(WsError::HeartbeatTimeout);
                    }
                    if self.heartbeat.should_send_ping() {
                        write.send(Message::Ping(Vec::new())).await?;
                        self.heartbeat.record_ping();
                        debug!("Sent keepalive ping");
                    }
                }
            }
        }
    }

    /// Decode and dispatch one frame. Returns false if shutdown interrupted it.
    async fn process_frame(&self, text: &str) -> bool {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        debug!(frame = %text, "Received message");

        let message = match decode_frame(text) {
            Ok(message) => message,
            Err(e) => {
                self.decode_errors.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, frame = %text, "Invalid JSON message, skipping");
                return true;
            }
        };

        let dispatch = async {
            let handled = self.handler.handle(message);
            match self.config.dispatch_timeout() {
                Some(limit) => {
                    if tokio::time::timeout(limit, handled).await.is_err() {
                        warn!(
                            timeout_ms = self.config.dispatch_timeout_ms,
                            "Dispatch timed out, continuing with next frame"
                        );
                    }
                }
                None => handled.await,
            }
        };

        tokio::select! {
            biased;
            () = self.shutdown_token.cancelled() => {
                warn!("Shutdown requested during dispatch, abandoning in-flight action");
                false
            }
            () = dispatch => true,
        }
    }
}

/// Send a Close frame, bounded in time; failures are only logged.
async fn close_quietly(write: &mut WsSink) {
    match tokio::time::timeout(CLOSE_FRAME_TIMEOUT, write.send(Message::Close(None))).await {
        Ok(Ok(())) => debug!("Close frame sent"),
        Ok(Err(e)) => warn!(error = %e, "Failed to send Close frame during shutdown"),
        Err(_) => warn!("Timed out sending Close frame during shutdown"),
    }
}
