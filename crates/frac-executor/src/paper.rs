//! Paper trading client.
//!
//! Accepts orders and records them in memory without contacting an exchange.
//! Authenticated when constructed with credentials, read-only otherwise, so
//! the dispatcher's authorization policy behaves exactly as it would against
//! a live client.

use crate::client::TradingClient;
use crate::credentials::Credentials;
use crate::error::{ClientError, ClientResult};
use chrono::{DateTime, Utc};
use frac_core::{ActionId, OrderSide, Price, Size};
use frac_ws::BoxFuture;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{info, warn};

/// First id handed out to simulated orders.
const FIRST_ORDER_ID: u64 = 1_000_000;

/// An order accepted by the paper client.
#[derive(Debug, Clone, Serialize)]
pub struct PaperOrder {
    pub order_id: u64,
    pub action: ActionId,
    pub symbol: String,
    pub size: Size,
    pub side: OrderSide,
    pub trigger_price: Option<Price>,
    pub reduce_only: bool,
    pub accepted_at: DateTime<Utc>,
}

/// Trading client that simulates order acceptance.
pub struct PaperTradingClient {
    credentials: Option<Credentials>,
    orders: Mutex<Vec<PaperOrder>>,
    next_order_id: AtomicU64,
    closed: AtomicBool,
}

impl PaperTradingClient {
    pub fn new(credentials: Option<Credentials>) -> Self {
        match &credentials {
            Some(creds) => info!(
                account = %creds.public_address(),
                "Initialized authenticated paper trading client"
            ),
            None => warn!("Initialized unauthenticated paper trading client"),
        }
        Self {
            credentials,
            orders: Mutex::new(Vec::new()),
            next_order_id: AtomicU64::new(FIRST_ORDER_ID),
            closed: AtomicBool::new(false),
        }
    }

    /// Account address, when authenticated.
    pub fn account(&self) -> Option<&str> {
        self.credentials.as_ref().map(Credentials::public_address)
    }

    /// Snapshot of accepted orders.
    pub fn orders(&self) -> Vec<PaperOrder> {
        self.orders.lock().clone()
    }

    fn accept(
        &self,
        action: ActionId,
        symbol: &str,
        size: Size,
        side: OrderSide,
        trigger_price: Option<Price>,
        reduce_only: bool,
    ) -> ClientResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ClientError::Closed);
        }
        if self.credentials.is_none() {
            return Err(ClientError::NotAuthenticated);
        }

        let order = PaperOrder {
            order_id: self.next_order_id.fetch_add(1, Ordering::Relaxed),
            action,
            symbol: symbol.to_string(),
            size,
            side,
            trigger_price,
            reduce_only,
            accepted_at: Utc::now(),
        };
        info!(
            order_id = order.order_id,
            action = %action,
            symbol = %order.symbol,
            size = %size,
            side = %side,
            trigger_price = ?trigger_price.map(|p| p.to_string()),
            reduce_only,
            "Paper order accepted"
        );
        self.orders.lock().push(order);
        Ok(())
    }
}

impl TradingClient for PaperTradingClient {
    fn execute_perp_trade<'a>(
        &'a self,
        symbol: &'a str,
        size: Size,
        side: OrderSide,
        reduce_only: bool,
    ) -> BoxFuture<'a, ClientResult<()>> {
        let result = self.accept(ActionId::ExecutePerpTrade, symbol, size, side, None, reduce_only);
        Box::pin(async move { result })
    }

    fn set_stop_loss<'a>(
        &'a self,
        symbol: &'a str,
        size: Size,
        trigger_price: Price,
        side: OrderSide,
    ) -> BoxFuture<'a, ClientResult<()>> {
        let result =
            self.accept(ActionId::SetStopLoss, symbol, size, side, Some(trigger_price), true);
        Box::pin(async move { result })
    }

    fn set_take_profit<'a>(
        &'a self,
        symbol: &'a str,
        size: Size,
        trigger_price: Price,
        side: OrderSide,
    ) -> BoxFuture<'a, ClientResult<()>> {
        let result =
            self.accept(ActionId::SetTakeProfit, symbol, size, side, Some(trigger_price), true);
        Box::pin(async move { result })
    }

    fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    fn close(&self) -> BoxFuture<'_, ClientResult<()>> {
        Box::pin(async move {
            if !self.closed.swap(true, Ordering::SeqCst) {
                info!(orders = self.orders.lock().len(), "Paper trading client closed");
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn credentials() -> Credentials {
        Credentials::from_parts(Some("0xkey".into()), Some("0xaddr".into())).unwrap()
    }

    #[tokio::test]
    async fn test_authenticated_client_records_orders() {
        let client = PaperTradingClient::new(Some(credentials()));
        assert!(client.is_authenticated());
        assert_eq!(client.account(), Some("0xaddr"));

        client
            .execute_perp_trade("BTC", Size::new(dec!(0.01)), OrderSide::Buy, false)
            .await
            .unwrap();
        client
            .set_stop_loss("BTC", Size::new(dec!(0.01)), Price::new(dec!(45000)), OrderSide::Sell)
            .await
            .unwrap();

        let orders = client.orders();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].order_id, FIRST_ORDER_ID);
        assert_eq!(orders[0].action, ActionId::ExecutePerpTrade);
        assert_eq!(orders[1].trigger_price, Some(Price::new(dec!(45000))));
        assert!(orders[1].reduce_only);
    }

    #[tokio::test]
    async fn test_read_only_client_rejects_orders() {
        let client = PaperTradingClient::new(None);
        assert!(!client.is_authenticated());

        let err = client
            .set_take_profit("ETH", Size::new(dec!(1)), Price::new(dec!(4000)), OrderSide::Sell)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
        assert!(client.orders().is_empty());
    }

    #[tokio::test]
    async fn test_closed_client_rejects_orders() {
        let client = PaperTradingClient::new(Some(credentials()));
        client.close().await.unwrap();
        client.close().await.unwrap();

        let err = client
            .execute_perp_trade("BTC", Size::new(dec!(1)), OrderSide::Buy, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Closed));
    }
}
