//! Frame handler trait.
//!
//! The connection manager hands every decoded frame to a `MessageHandler`
//! and waits for it to finish before reading the next frame.

use crate::message::InboundMessage;
use std::pin::Pin;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Consumer of inbound frames.
///
/// Implementations must not fail: anything that goes wrong while handling a
/// message is logged and swallowed so the receive loop keeps running.
pub trait MessageHandler: Send + Sync {
    fn handle(&self, message: InboundMessage) -> BoxFuture<'_, ()>;
}
