//! WebSocket error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WsError {
    /// Missing or malformed connection settings. Fatal, never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connect timed out after {0}ms")]
    ConnectTimeout(u64),

    #[error("Connection closed: code={code}, reason={reason}")]
    ConnectionClosed { code: u16, reason: String },

    #[error("Heartbeat timeout")]
    HeartbeatTimeout,

    #[error("Frame decode error: {0}")]
    Decode(String),

    #[error("Connection manager already stopped")]
    Stopped,

    #[error("Tungstenite error: {0}")]
    Tungstenite(#[from] tokio_tungstenite::tungstenite::Error),
}

impl WsError {
    /// Whether the error belongs to the fail-fast configuration class.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

pub type WsResult<T> = Result<T, WsError>;
