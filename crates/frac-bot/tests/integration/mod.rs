//! Integration tests for frac-bot.
//!
//! These tests drive the executor against a local WebSocket server:
//! - Handshake authentication
//! - Frame dispatch to the trading client
//! - Reconnection and teardown

pub mod common;
