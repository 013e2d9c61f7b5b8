//! Mock trading client for testing.

use crate::client::TradingClient;
use crate::error::{ClientError, ClientResult};
use frac_core::{OrderSide, Price, Size};
use frac_ws::BoxFuture;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

/// One recorded adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCall {
    ExecutePerpTrade {
        symbol: String,
        size: Size,
        side: OrderSide,
        reduce_only: bool,
    },
    SetStopLoss {
        symbol: String,
        size: Size,
        trigger_price: Price,
        side: OrderSide,
    },
    SetTakeProfit {
        symbol: String,
        size: Size,
        trigger_price: Price,
        side: OrderSide,
    },
}

/// Mock trading client that records every call.
#[derive(Debug)]
pub struct MockTradingClient {
    /// Recorded calls for verification.
    calls: Mutex<Vec<ClientCall>>,
    /// Error returned by every order call when set.
    failure: Mutex<Option<ClientError>>,
    /// Artificial latency of order calls.
    delay: Mutex<Option<Duration>>,
    authenticated: AtomicBool,
    close_count: AtomicU32,
}

impl Default for MockTradingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTradingClient {
    /// Create an authenticated mock client.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            delay: Mutex::new(None),
            authenticated: AtomicBool::new(true),
            close_count: AtomicU32::new(0),
        }
    }

    /// Create a read-only mock client.
    pub fn unauthenticated() -> Self {
        let client = Self::new();
        client.set_authenticated(false);
        client
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::SeqCst);
    }

    /// Make every order call fail with `error` (None restores success).
    pub fn set_failure(&self, error: Option<ClientError>) {
        *self.failure.lock() = error;
    }

    /// Delay every order call by `delay` before recording it.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    /// Get recorded calls.
    pub fn calls(&self) -> Vec<ClientCall> {
        self.calls.lock().clone()
    }

    /// Number of `close` invocations.
    pub fn close_count(&self) -> u32 {
        self.close_count.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.close_count() > 0
    }

    async fn record(&self, call: ClientCall) -> ClientResult<()> {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().push(call);
        let failure = self.failure.lock().clone();
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl TradingClient for MockTradingClient {
    fn execute_perp_trade<'a>(
        &'a self,
        symbol: &'a str,
        size: Size,
        side: OrderSide,
        reduce_only: bool,
    ) -> BoxFuture<'a, ClientResult<()>> {
        Box::pin(self.record(ClientCall::ExecutePerpTrade {
            symbol: symbol.to_string(),
            size,
            side,
            reduce_only,
        }))
    }

    fn set_stop_loss<'a>(
        &'a self,
        symbol: &'a str,
        size: Size,
        trigger_price: Price,
        side: OrderSide,
    ) -> BoxFuture<'a, ClientResult<()>> {
        Box::pin(self.record(ClientCall::SetStopLoss {
            symbol: symbol.to_string(),
            size,
            trigger_price,
            side,
        }))
    }

    fn set_take_profit<'a>(
        &'a self,
        symbol: &'a str,
        size: Size,
        trigger_price: Price,
        side: OrderSide,
    ) -> BoxFuture<'a, ClientResult<()>> {
        Box::pin(self.record(ClientCall::SetTakeProfit {
            symbol: symbol.to_string(),
            size,
            trigger_price,
            side,
        }))
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    fn close(&self) -> BoxFuture<'_, ClientResult<()>> {
        Box::pin(async move {
            self.close_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}
