//! Inbound message envelope.
//!
//! ```json
//! {"type": "ACTION", "data": {"action_id": "...", "config": {...}}}
//! ```
//!
//! Every field is optional on the wire; absent fields decode to empty values
//! so routing decisions (and their log lines) happen in the dispatcher.

use crate::error::{WsError, WsResult};
use serde::{Deserialize, Serialize};

/// The only message type that carries work.
pub const ACTION_MESSAGE_TYPE: &str = "ACTION";

/// Wire-level envelope of one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "type", default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub data: Option<ActionData>,
}

/// Payload of an `ACTION` message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionData {
    #[serde(default)]
    pub action_id: Option<String>,
    /// Opaque mapping forwarded to the handler as-is.
    #[serde(default)]
    pub config: serde_json::Value,
}

impl InboundMessage {
    /// Build an `ACTION` message (used by tests and tooling).
    pub fn action(action_id: impl Into<String>, config: serde_json::Value) -> Self {
        Self {
            message_type: Some(ACTION_MESSAGE_TYPE.to_string()),
            data: Some(ActionData {
                action_id: Some(action_id.into()),
                config,
            }),
        }
    }

    /// Message type as sent, or "" when absent.
    pub fn message_type(&self) -> &str {
        self.message_type.as_deref().unwrap_or("")
    }

    /// Case-insensitive check for `type == "ACTION"`.
    pub fn is_action(&self) -> bool {
        self.message_type()
            .trim()
            .eq_ignore_ascii_case(ACTION_MESSAGE_TYPE)
    }

    /// Action id as sent, or "" when absent.
    pub fn action_id(&self) -> &str {
        self.data
            .as_ref()
            .and_then(|d| d.action_id.as_deref())
            .unwrap_or("")
    }

    /// Action config, `Value::Null` when absent.
    pub fn config(&self) -> &serde_json::Value {
        static NULL: serde_json::Value = serde_json::Value::Null;
        self.data.as_ref().map(|d| &d.config).unwrap_or(&NULL)
    }
}

/// Decode one text frame into an envelope.
///
/// Fails for anything that is not a JSON object of the envelope shape.
pub fn decode_frame(text: &str) -> WsResult<InboundMessage> {
    serde_json::from_str(text).map_err(|e| WsError::Decode(e.to_string()))
}
