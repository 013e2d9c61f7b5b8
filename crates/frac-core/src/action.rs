//! Typed action payloads.
//!
//! An action arrives as `{"action_id": ..., "config": {...}}`. The id selects
//! one of the shapes below; `validate` turns the raw config into one of them.

use crate::error::CoreError;
use crate::{OrderSide, Price, Size};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Supported action identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionId {
    /// Open, increase or reduce a perp position.
    ExecutePerpTrade,
    /// Place a stop-loss trigger order.
    SetStopLoss,
    /// Place a take-profit trigger order.
    SetTakeProfit,
}

impl ActionId {
    pub const EXECUTE_PERP_TRADE: &'static str = "execute_hyperliquid_perp_trade";
    pub const SET_STOP_LOSS: &'static str = "set_hyperliquid_perp_stop_loss";
    pub const SET_TAKE_PROFIT: &'static str = "set_hyperliquid_perp_take_profit";

    /// Wire identifier (lower-case).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExecutePerpTrade => Self::EXECUTE_PERP_TRADE,
            Self::SetStopLoss => Self::SET_STOP_LOSS,
            Self::SetTakeProfit => Self::SET_TAKE_PROFIT,
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionId {
    type Err = CoreError;

    /// Case-insensitive match against the wire identifiers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim();
        [Self::ExecutePerpTrade, Self::SetStopLoss, Self::SetTakeProfit]
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(id))
            .ok_or_else(|| CoreError::UnknownAction(s.to_string()))
    }
}

/// Informational metadata attached to a trade. Logged, never validated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TradeMetadata {
    /// Reference price the signal was generated at.
    pub price: Option<String>,
    /// Leverage used by the source.
    pub leverage: Option<String>,
    /// Wallet the signal was copied from.
    pub source_wallet: Option<String>,
}

/// Validated perp trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeOrderConfig {
    pub symbol: String,
    pub size: Size,
    pub side: OrderSide,
    pub reduce_only: bool,
    /// Set when the distributing server has already executed this trade;
    /// the local client must not duplicate it.
    pub server_execution: bool,
    pub metadata: TradeMetadata,
}

/// Validated stop-loss or take-profit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopConfig {
    pub symbol: String,
    pub size: Size,
    pub trigger_price: Price,
    pub side: OrderSide,
}

/// A validated action, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionConfig {
    Trade(TradeOrderConfig),
    StopLoss(StopConfig),
    TakeProfit(StopConfig),
}

impl ActionConfig {
    /// The action id this config belongs to.
    pub fn action_id(&self) -> ActionId {
        match self {
            Self::Trade(_) => ActionId::ExecutePerpTrade,
            Self::StopLoss(_) => ActionId::SetStopLoss,
            Self::TakeProfit(_) => ActionId::SetTakeProfit,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Self::Trade(trade) => &trade.symbol,
            Self::StopLoss(stop) | Self::TakeProfit(stop) => &stop.symbol,
        }
    }
}
