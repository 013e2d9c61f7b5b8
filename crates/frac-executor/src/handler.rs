//! Per-action handlers.
//!
//! Each handler validates its raw config, applies the execution policy and
//! calls the trading client at most once. A handler never fails: validation
//! and client errors are logged and reported as `false`.

use crate::client::TradingClient;
use frac_core::{parse_stop_order, parse_trade_order, ActionId, StopConfig};
use frac_ws::BoxFuture;
use serde_json::Value;
use tracing::{error, info, warn};

/// Overridable handlers, one per supported action.
///
/// The default methods delegate to [`place_order`], [`place_stop_loss`] and
/// [`place_take_profit`]. The return value reports whether an order reached
/// the client successfully.
pub trait ActionHandler: Send + Sync {
    fn handle_trade<'a>(
        &'a self,
        client: &'a dyn TradingClient,
        config: &'a Value,
    ) -> BoxFuture<'a, bool> {
        Box::pin(place_order(client, config))
    }

    fn handle_stop_loss<'a>(
        &'a self,
        client: &'a dyn TradingClient,
        config: &'a Value,
    ) -> BoxFuture<'a, bool> {
        Box::pin(place_stop_loss(client, config))
    }

    fn handle_take_profit<'a>(
        &'a self,
        client: &'a dyn TradingClient,
        config: &'a Value,
    ) -> BoxFuture<'a, bool> {
        Box::pin(place_take_profit(client, config))
    }
}

/// Handler set with the stock behavior.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultActionHandler;

impl ActionHandler for DefaultActionHandler {}

/// Execute a perp trade unless the server already did.
///
/// Skipped when `metadata.server_execution` is set, or when the client is
/// not authenticated.
pub async fn place_order(client: &dyn TradingClient, config: &Value) -> bool {
    let order = match parse_trade_order(config) {
        Ok(order) => order,
        Err(e) => {
            error!(action = %ActionId::ExecutePerpTrade, error = %e, "Invalid trade config");
            return false;
        }
    };

    info!(
        symbol = %order.symbol,
        size = %order.size,
        side = %order.side,
        reduce_only = order.reduce_only,
        server_execution = order.server_execution,
        price = ?order.metadata.price,
        leverage = ?order.metadata.leverage,
        source_wallet = ?order.metadata.source_wallet,
        "Received trade signal"
    );

    if order.server_execution {
        info!(symbol = %order.symbol, "Trade already executed by server, skipping");
        return false;
    }
    if !client.is_authenticated() {
        warn!(symbol = %order.symbol, "Client not authenticated, trade not executed");
        return false;
    }

    match client
        .execute_perp_trade(&order.symbol, order.size, order.side, order.reduce_only)
        .await
    {
        Ok(()) => {
            info!(
                symbol = %order.symbol,
                size = %order.size,
                side = %order.side,
                "Trade executed"
            );
            true
        }
        Err(e) => {
            error!(symbol = %order.symbol, error = %e, "Trade execution failed");
            false
        }
    }
}

/// Place a stop-loss trigger order.
pub async fn place_stop_loss(client: &dyn TradingClient, config: &Value) -> bool {
    place_trigger_order(client, TriggerKind::StopLoss, config).await
}

/// Place a take-profit trigger order.
pub async fn place_take_profit(client: &dyn TradingClient, config: &Value) -> bool {
    place_trigger_order(client, TriggerKind::TakeProfit, config).await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TriggerKind {
    StopLoss,
    TakeProfit,
}

impl TriggerKind {
    fn action_id(self) -> ActionId {
        match self {
            Self::StopLoss => ActionId::SetStopLoss,
            Self::TakeProfit => ActionId::SetTakeProfit,
        }
    }
}

async fn place_trigger_order(
    client: &dyn TradingClient,
    kind: TriggerKind,
    config: &Value,
) -> bool {
    let action = kind.action_id();
    let stop: StopConfig = match parse_stop_order(config) {
        Ok(stop) => stop,
        Err(e) => {
            error!(action = %action, error = %e, "Invalid trigger order config");
            return false;
        }
    };

    info!(
        action = %action,
        symbol = %stop.symbol,
        size = %stop.size,
        trigger_price = %stop.trigger_price,
        side = %stop.side,
        "Placing trigger order"
    );

    let result = match kind {
        TriggerKind::StopLoss => {
            client
                .set_stop_loss(&stop.symbol, stop.size, stop.trigger_price, stop.side)
                .await
        }
        TriggerKind::TakeProfit => {
            client
                .set_take_profit(&stop.symbol, stop.size, stop.trigger_price, stop.side)
                .await
        }
    };

    match result {
        Ok(()) => {
            info!(action = %action, symbol = %stop.symbol, "Trigger order placed");
            true
        }
        Err(e) => {
            error!(action = %action, symbol = %stop.symbol, error = %e, "Trigger order failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::mock::{ClientCall, MockTradingClient};
    use frac_core::{OrderSide, Price, Size};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn trade_config(server_execution: bool) -> Value {
        json!({
            "position": {"symbol": "BTC", "size": "0.01", "side": "BUY"},
            "metadata": {"server_execution": server_execution, "price": "50000"}
        })
    }

    #[tokio::test]
    async fn test_place_order_executes_once() {
        let client = MockTradingClient::new();
        assert!(place_order(&client, &trade_config(false)).await);

        assert_eq!(
            client.calls(),
            vec![ClientCall::ExecutePerpTrade {
                symbol: "BTC".to_string(),
                size: Size::new(dec!(0.01)),
                side: OrderSide::Buy,
                reduce_only: false,
            }]
        );
    }

    #[tokio::test]
    async fn test_place_order_skips_server_executed_trade() {
        let client = MockTradingClient::new();
        assert!(!place_order(&client, &trade_config(true)).await);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_place_order_requires_authentication() {
        let client = MockTradingClient::unauthenticated();
        assert!(!place_order(&client, &trade_config(false)).await);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_place_order_rejects_invalid_config() {
        let client = MockTradingClient::new();
        let config = json!({"position": {"symbol": "BTC", "size": "0.01", "side": "LONG"}});
        assert!(!place_order(&client, &config).await);

        let config = json!({"position": {"symbol": "BTC", "side": "BUY"}});
        assert!(!place_order(&client, &config).await);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_place_order_reports_client_failure() {
        let client = MockTradingClient::new();
        client.set_failure(Some(ClientError::Rejected("insufficient margin".into())));

        assert!(!place_order(&client, &trade_config(false)).await);
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_trigger_orders_ignore_authentication() {
        let client = MockTradingClient::unauthenticated();
        let sl = json!({
            "position": {"symbol": "BTC", "size": "0.01", "trigger_price": "45000", "side": "SELL"}
        });
        let tp = json!({
            "position": {"symbol": "BTC", "size": "0.01", "trigger_price": 55000, "side": "sell"}
        });

        assert!(place_stop_loss(&client, &sl).await);
        assert!(place_take_profit(&client, &tp).await);

        assert_eq!(
            client.calls(),
            vec![
                ClientCall::SetStopLoss {
                    symbol: "BTC".to_string(),
                    size: Size::new(dec!(0.01)),
                    trigger_price: Price::new(dec!(45000)),
                    side: OrderSide::Sell,
                },
                ClientCall::SetTakeProfit {
                    symbol: "BTC".to_string(),
                    size: Size::new(dec!(0.01)),
                    trigger_price: Price::new(dec!(55000)),
                    side: OrderSide::Sell,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_each_trigger_kind_calls_only_its_client_method() {
        let config = json!({
            "position": {"symbol": "ETH", "size": "2", "trigger_price": "3000", "side": "BUY"}
        });
        let expected_size = Size::new(dec!(2));
        let expected_price = Price::new(dec!(3000));

        let client = MockTradingClient::new();
        assert!(place_stop_loss(&client, &config).await);
        assert_eq!(
            client.calls(),
            vec![ClientCall::SetStopLoss {
                symbol: "ETH".to_string(),
                size: expected_size,
                trigger_price: expected_price,
                side: OrderSide::Buy,
            }]
        );

        let client = MockTradingClient::new();
        assert!(place_take_profit(&client, &config).await);
        assert_eq!(
            client.calls(),
            vec![ClientCall::SetTakeProfit {
                symbol: "ETH".to_string(),
                size: expected_size,
                trigger_price: expected_price,
                side: OrderSide::Buy,
            }]
        );
    }

    #[test]
    fn test_trigger_kind_action_ids() {
        assert_eq!(TriggerKind::StopLoss.action_id(), ActionId::SetStopLoss);
        assert_eq!(TriggerKind::TakeProfit.action_id(), ActionId::SetTakeProfit);
    }

    #[tokio::test]
    async fn test_trigger_order_missing_price_is_rejected() {
        let client = MockTradingClient::new();
        let config = json!({"position": {"symbol": "BTC", "size": "0.01", "side": "SELL"}});
        assert!(!place_stop_loss(&client, &config).await);
        assert!(client.calls().is_empty());
    }

    struct CountingHandler {
        trades: std::sync::atomic::AtomicU32,
    }

    impl ActionHandler for CountingHandler {
        fn handle_trade<'a>(
            &'a self,
            _client: &'a dyn TradingClient,
            _config: &'a Value,
        ) -> BoxFuture<'a, bool> {
            self.trades.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Box::pin(async { false })
        }
    }

    #[tokio::test]
    async fn test_overridden_handler_replaces_default() {
        let handler = CountingHandler {
            trades: std::sync::atomic::AtomicU32::new(0),
        };
        let client = MockTradingClient::new();

        assert!(!handler.handle_trade(&client, &trade_config(false)).await);
        assert_eq!(handler.trades.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert!(client.calls().is_empty());

        // Non-overridden methods keep the default behavior.
        let sl = json!({
            "position": {"symbol": "ETH", "size": 1, "trigger_price": 3000, "side": "SELL"}
        });
        assert!(handler.handle_stop_loss(&client, &sl).await);
        assert_eq!(client.calls().len(), 1);
    }
}
