//! Action payload validation.
//!
//! Pure functions: a raw `config` object in, a typed config or a
//! `ValidationError` out. Field rules:
//! - absent, `null` or blank  -> `MissingField`
//! - numbers accept JSON strings or numbers and must be strictly positive,
//!   otherwise `InvalidNumeric`
//! - `side` must be BUY or SELL in any case, flags must be JSON booleans,
//!   otherwise `InvalidEnum`

use crate::action::{ActionConfig, ActionId, StopConfig, TradeMetadata, TradeOrderConfig};
use crate::error::ValidationError;
use crate::{OrderSide, Price, Size};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

/// Parse the config of `action` into its typed shape.
pub fn parse_action(action: ActionId, config: &Value) -> Result<ActionConfig, ValidationError> {
    match action {
        ActionId::ExecutePerpTrade => parse_trade_order(config).map(ActionConfig::Trade),
        ActionId::SetStopLoss => parse_stop_order(config).map(ActionConfig::StopLoss),
        ActionId::SetTakeProfit => parse_stop_order(config).map(ActionConfig::TakeProfit),
    }
}

/// Parse `config.position` + `config.metadata` into a trade order.
pub fn parse_trade_order(config: &Value) -> Result<TradeOrderConfig, ValidationError> {
    let empty = Map::new();
    let position = object_field(config, "position").unwrap_or(&empty);
    let metadata = object_field(config, "metadata").unwrap_or(&empty);

    let symbol = symbol_field(position)?;
    let size = Size::new(positive_decimal_field(position, "size")?);
    let side = side_field(position)?;
    let reduce_only = bool_field(position, "reduce_only")?;
    let server_execution = bool_field(metadata, "server_execution")?;

    Ok(TradeOrderConfig {
        symbol,
        size,
        side,
        reduce_only,
        server_execution,
        metadata: TradeMetadata {
            price: display_field(metadata, "price"),
            leverage: display_field(metadata, "leverage"),
            source_wallet: display_field(metadata, "source_wallet"),
        },
    })
}

/// Parse `config.position` into a stop-loss / take-profit order.
///
/// All of `symbol`, `size`, `trigger_price` and `side` are mandatory.
pub fn parse_stop_order(config: &Value) -> Result<StopConfig, ValidationError> {
    let empty = Map::new();
    let position = object_field(config, "position").unwrap_or(&empty);

    let symbol = symbol_field(position)?;
    let size = Size::new(positive_decimal_field(position, "size")?);
    let trigger_price = Price::new(positive_decimal_field(position, "trigger_price")?);
    let side = side_field(position)?;

    Ok(StopConfig {
        symbol,
        size,
        trigger_price,
        side,
    })
}

fn object_field<'a>(value: &'a Value, name: &str) -> Option<&'a Map<String, Value>> {
    value.get(name).and_then(Value::as_object)
}

fn present<'a>(obj: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    match obj.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(v) => Some(v),
    }
}

fn symbol_field(position: &Map<String, Value>) -> Result<String, ValidationError> {
    present(position, "symbol")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .ok_or(ValidationError::MissingField("symbol"))
}

fn side_field(position: &Map<String, Value>) -> Result<OrderSide, ValidationError> {
    let raw = present(position, "side").ok_or(ValidationError::MissingField("side"))?;
    raw.as_str()
        .and_then(|s| OrderSide::from_str(s).ok())
        .ok_or(ValidationError::InvalidEnum("side"))
}

fn positive_decimal_field(
    obj: &Map<String, Value>,
    name: &'static str,
) -> Result<Decimal, ValidationError> {
    let raw = present(obj, name).ok_or(ValidationError::MissingField(name))?;
    let parsed = match raw {
        Value::String(s) => parse_decimal(s.trim()),
        Value::Number(n) => parse_decimal(&n.to_string()),
        _ => None,
    }
    .ok_or(ValidationError::InvalidNumeric(name))?;

    if parsed.is_sign_negative() || parsed.is_zero() {
        return Err(ValidationError::InvalidNumeric(name));
    }
    Ok(parsed)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn bool_field(obj: &Map<String, Value>, name: &'static str) -> Result<bool, ValidationError> {
    match obj.get(name) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(ValidationError::InvalidEnum(name)),
    }
}

fn display_field(obj: &Map<String, Value>, name: &str) -> Option<String> {
    match present(obj, name)? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn trade_config() -> Value {
        json!({
            "position": {
                "symbol": "BTC",
                "size": "0.01",
                "side": "buy",
                "reduce_only": false
            },
            "metadata": {
                "server_execution": false,
                "price": 50000.5,
                "leverage": 5,
                "source_wallet": "0xabc"
            }
        })
    }

    #[test]
    fn test_parse_trade_order_normalizes_values() {
        let trade = parse_trade_order(&trade_config()).unwrap();

        assert_eq!(trade.symbol, "BTC");
        assert_eq!(trade.size, Size::new(dec!(0.01)));
        assert_eq!(trade.side, OrderSide::Buy);
        assert!(!trade.reduce_only);
        assert!(!trade.server_execution);
        assert_eq!(trade.metadata.price.as_deref(), Some("50000.5"));
        assert_eq!(trade.metadata.leverage.as_deref(), Some("5"));
        assert_eq!(trade.metadata.source_wallet.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_parse_trade_order_defaults_flags() {
        let config = json!({
            "position": {"symbol": "ETH", "size": 1.5, "side": "SELL"}
        });
        let trade = parse_trade_order(&config).unwrap();

        assert_eq!(trade.size, Size::new(dec!(1.5)));
        assert!(!trade.reduce_only);
        assert!(!trade.server_execution);
        assert_eq!(trade.metadata, TradeMetadata::default());
    }

    #[test]
    fn test_parse_trade_order_missing_fields() {
        let no_symbol = json!({"position": {"size": "1", "side": "BUY"}});
        assert_eq!(
            parse_trade_order(&no_symbol).unwrap_err(),
            ValidationError::MissingField("symbol")
        );

        let no_size = json!({"position": {"symbol": "BTC", "side": "BUY"}});
        assert_eq!(
            parse_trade_order(&no_size).unwrap_err(),
            ValidationError::MissingField("size")
        );

        let blank_side = json!({"position": {"symbol": "BTC", "size": "1", "side": ""}});
        assert_eq!(
            parse_trade_order(&blank_side).unwrap_err(),
            ValidationError::MissingField("side")
        );

        assert_eq!(
            parse_trade_order(&json!({})).unwrap_err(),
            ValidationError::MissingField("symbol")
        );
    }

    #[test]
    fn test_parse_trade_order_rejects_zero_and_garbage_size() {
        for size in [json!("0"), json!(0), json!("-0.5"), json!("abc"), json!(true)] {
            let config = json!({"position": {"symbol": "BTC", "size": size, "side": "BUY"}});
            assert_eq!(
                parse_trade_order(&config).unwrap_err(),
                ValidationError::InvalidNumeric("size"),
                "size {size} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_trade_order_rejects_unknown_side() {
        let config = json!({"position": {"symbol": "BTC", "size": "1", "side": "LONG"}});
        assert_eq!(
            parse_trade_order(&config).unwrap_err(),
            ValidationError::InvalidEnum("side")
        );
    }

    #[test]
    fn test_parse_trade_order_rejects_non_bool_flag() {
        let config = json!({
            "position": {"symbol": "BTC", "size": "1", "side": "BUY"},
            "metadata": {"server_execution": "yes"}
        });
        assert_eq!(
            parse_trade_order(&config).unwrap_err(),
            ValidationError::InvalidEnum("server_execution")
        );
    }

    #[test]
    fn test_parse_stop_order() {
        let config = json!({
            "position": {
                "symbol": "BTC",
                "size": "0.01",
                "side": "SELL",
                "trigger_price": "45000",
                "reduce_only": true
            }
        });
        let stop = parse_stop_order(&config).unwrap();

        assert_eq!(stop.symbol, "BTC");
        assert_eq!(stop.size, Size::new(dec!(0.01)));
        assert_eq!(stop.trigger_price, Price::new(dec!(45000)));
        assert_eq!(stop.side, OrderSide::Sell);
    }

    #[test]
    fn test_parse_stop_order_requires_every_field() {
        let full =
            json!({"symbol": "BTC", "size": "0.01", "side": "SELL", "trigger_price": "45000"});
        for (field, expected) in [
            ("symbol", ValidationError::MissingField("symbol")),
            ("size", ValidationError::MissingField("size")),
            ("trigger_price", ValidationError::MissingField("trigger_price")),
            ("side", ValidationError::MissingField("side")),
        ] {
            let mut position = full.clone();
            position.as_object_mut().unwrap().remove(field);
            let config = json!({ "position": position });
            assert_eq!(parse_stop_order(&config).unwrap_err(), expected);
        }
    }

    #[test]
    fn test_parse_stop_order_scientific_number() {
        let config = json!({
            "position": {"symbol": "PEPE", "size": 1e6, "side": "sell", "trigger_price": "1.2e-5"}
        });
        let stop = parse_stop_order(&config).unwrap();
        assert_eq!(stop.size, Size::new(dec!(1000000)));
        assert_eq!(stop.trigger_price, Price::new(dec!(0.000012)));
    }

    #[test]
    fn test_parse_action_tags_kind() {
        let config = json!({
            "position": {"symbol": "BTC", "size": "1", "side": "SELL", "trigger_price": "55000"}
        });
        let parsed = parse_action(ActionId::SetTakeProfit, &config).unwrap();
        assert_eq!(parsed.action_id(), ActionId::SetTakeProfit);
        assert_eq!(parsed.symbol(), "BTC");
    }
}
