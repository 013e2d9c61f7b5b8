//! Trading client trait.
//!
//! Abstracts the trade-execution client so the dispatcher can be driven by
//! a real exchange client, the paper client, or a test double.
//!
//! Calls are not idempotent: the dispatcher invokes each at most once per
//! inbound action.

use crate::error::ClientResult;
use frac_core::{OrderSide, Price, Size};
use frac_ws::BoxFuture;

/// Capability set the dispatcher needs from a trade-execution client.
pub trait TradingClient: Send + Sync {
    /// Market order on a perpetual.
    fn execute_perp_trade<'a>(
        &'a self,
        symbol: &'a str,
        size: Size,
        side: OrderSide,
        reduce_only: bool,
    ) -> BoxFuture<'a, ClientResult<()>>;

    /// Stop-loss trigger order.
    fn set_stop_loss<'a>(
        &'a self,
        symbol: &'a str,
        size: Size,
        trigger_price: Price,
        side: OrderSide,
    ) -> BoxFuture<'a, ClientResult<()>>;

    /// Take-profit trigger order.
    fn set_take_profit<'a>(
        &'a self,
        symbol: &'a str,
        size: Size,
        trigger_price: Price,
        side: OrderSide,
    ) -> BoxFuture<'a, ClientResult<()>>;

    /// Whether the client holds credentials that allow trading.
    fn is_authenticated(&self) -> bool;

    /// Release sessions and connections. Called once at teardown.
    fn close(&self) -> BoxFuture<'_, ClientResult<()>>;
}
