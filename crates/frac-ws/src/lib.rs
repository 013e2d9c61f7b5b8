//! WebSocket client for the Fractrade executor endpoint.
//!
//! Provides a long-lived connection with:
//! - `Authorization` header authentication on every (re)connect
//! - Fixed-delay reconnection without attempt cap
//! - Keepalive ping/pong with timeout detection
//! - Strictly ordered, one-at-a-time frame dispatch

pub mod connection;
pub mod error;
pub mod handler;
pub mod heartbeat;
pub mod message;

pub use connection::{
    executor_endpoint, ConnectionConfig, ConnectionManager, ConnectionState, ConnectionStats,
    DEFAULT_RECONNECT_DELAY, EXECUTOR_PATH,
};
pub use error::{WsError, WsResult};
pub use handler::{BoxFuture, MessageHandler};
pub use message::{decode_frame, ActionData, InboundMessage, ACTION_MESSAGE_TYPE};
