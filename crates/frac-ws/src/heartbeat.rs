//! Heartbeat management for the WebSocket connection.
//!
//! Sends a transport-level ping when the connection has been idle for the
//! ping interval and declares the connection dead if nothing (pong or any
//! other frame) arrives within the ping timeout.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Heartbeat manager for WebSocket connection health.
pub struct HeartbeatManager {
    /// Idle time before a ping is sent.
    interval: Duration,
    /// How long to wait for any inbound traffic after a ping.
    timeout: Duration,
    state: Mutex<HeartbeatState>,
}

#[derive(Debug, Clone, Copy)]
struct HeartbeatState {
    last_ping: Option<Instant>,
    last_pong: Option<Instant>,
    last_message: Instant,
    waiting_for_pong: bool,
}

impl HeartbeatState {
    fn fresh() -> Self {
        Self {
            last_ping: None,
            last_pong: None,
            last_message: Instant::now(),
            waiting_for_pong: false,
        }
    }
}

impl HeartbeatManager {
    /// Create a new heartbeat manager.
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout,
            state: Mutex::new(HeartbeatState::fresh()),
        }
    }

    /// Reset heartbeat state (called on connection).
    pub fn reset(&self) {
        *self.state.lock() = HeartbeatState::fresh();
    }

    /// Record that a ping was sent.
    pub fn record_ping(&self) {
        let mut state = self.state.lock();
        state.last_ping = Some(Instant::now());
        state.waiting_for_pong = true;
    }

    /// Record that a pong was received.
    pub fn record_pong(&self) {
        let now = Instant::now();
        let mut state = self.state.lock();
        if let Some(ping_time) = state.last_ping {
            debug!(rtt_ms = now.duration_since(ping_time).as_millis() as u64, "Received pong");
        }
        state.last_pong = Some(now);
        state.last_message = now;
        state.waiting_for_pong = false;
    }

    /// Record that any frame was received. Counts as proof of liveness.
    pub fn record_message(&self) {
        let mut state = self.state.lock();
        state.last_message = Instant::now();
        state.waiting_for_pong = false;
    }

    /// Whether the outstanding ping has gone unanswered for too long.
    pub fn is_timed_out(&self) -> bool {
        let state = self.state.lock();
        if !state.waiting_for_pong {
            return false;
        }
        state
            .last_ping
            .is_some_and(|ping_time| ping_time.elapsed() > self.timeout)
    }

    /// Whether the connection has been idle long enough to ping.
    pub fn should_send_ping(&self) -> bool {
        let state = self.state.lock();
        !state.waiting_for_pong && state.last_message.elapsed() >= self.interval
    }

    /// Time between health checks.
    pub fn check_interval(&self) -> Duration {
        (self.interval.min(self.timeout) / 2).max(Duration::from_millis(10))
    }

    /// Wait for the next heartbeat check.
    pub async fn wait_for_check(&self) {
        tokio::time::sleep(self.check_interval()).await;
    }

    /// Time since the last inbound frame.
    pub fn idle_for(&self) -> Duration {
        self.state.lock().last_message.elapsed()
    }
}
