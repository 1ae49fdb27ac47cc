//! Message types exchanged over every relay connection.
//!
//! Both peers speak JSON objects over WebSocket text frames.  Inbound
//! messages are recognised by *shape* rather than by a strict schema (see
//! [`Envelope`]), while everything the relay itself emits is a tagged object
//! with a `"type"` field (see [`OutboundMsg`]).
//!
//! # Message flow
//!
//! ```text
//! Device  → Relay:  {"type":"esp32_connected"}          announce role
//! Any     → Relay:  {"type":"ping"}                     liveness check
//! Browser → Relay:  {"row":3,"col":4}                   position command
//! Relay   → Device: {"row":3,"col":4}                   forwarded unchanged
//! Device  → Relay:  {"result":true}                     outcome report
//! Relay   → Browser:{"type":"movement_result",...}      outcome, reworded
//! Relay   → Browser:{"type":"esp32_status",...}         device came / went
//! Relay   → Sender: {"type":"error",...} / {"type":"pong"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status text when the device slot is occupied.
pub const DEVICE_CONNECTED: &str = "ESP32 connected";
/// Status text when the device slot is empty.
pub const DEVICE_NOT_CONNECTED: &str = "ESP32 not connected";
/// Status text pushed to the browser when the device socket closes.
pub const DEVICE_DISCONNECTED: &str = "ESP32 disconnected";
/// Outcome text for `{"result": true}`.
pub const MOVEMENT_SUCCEEDED: &str = "Movement completed successfully";
/// Outcome text for `{"result": false}`.
pub const MOVEMENT_FAILED: &str = "Movement failed";

// ── Inbound ───────────────────────────────────────────────────────────────────

/// One parsed inbound message, classified by structure.
///
/// Extra fields are ignored for classification.  When several shapes match,
/// the earlier variant wins: a `{"type":"ping","row":1,"col":2}` is a
/// [`Envelope::Ping`].
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// `{"type":"esp32_connected"}`: the sender is the device.
    DeviceAnnounce,
    /// `{"type":"ping"}`: answered with a pong, never changes any role.
    Ping,
    /// An object carrying both `row` and `col`.
    Position(PositionCommand),
    /// `{"result": bool}` from the device after executing a command.
    Result(bool),
    /// Any other JSON object.  From an unclassified socket this is an
    /// implicit browser handshake.
    Other,
}

impl Envelope {
    /// Short name for log lines, so payloads are not echoed wholesale.
    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::DeviceAnnounce => "esp32_connected",
            Envelope::Ping => "ping",
            Envelope::Position(_) => "position",
            Envelope::Result(_) => "result",
            Envelope::Other => "other",
        }
    }
}

/// A `{row, col}` command travelling from the browser to the device.
///
/// The inbound frame text is kept so it can be delivered to the device
/// byte-for-byte, including any extra fields the browser attached.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionCommand {
    /// The inbound frame exactly as received.
    pub raw: String,
    /// Value of the `row` field (usually an integer).
    pub row: Value,
    /// Value of the `col` field (usually an integer).
    pub col: Value,
}

// ── Outbound ──────────────────────────────────────────────────────────────────

/// Every message the relay originates itself.
///
/// # Serde representation
///
/// ```json
/// {"type":"pong"}
/// {"type":"movement_result","result":true,"message":"Movement completed successfully"}
/// {"type":"esp32_status","connected":false,"message":"ESP32 disconnected"}
/// {"type":"error","message":"ESP32 not connected"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMsg {
    /// Reply to `{"type":"ping"}`.
    Pong,

    /// Device outcome report, reworded for the browser.
    MovementResult { result: bool, message: String },

    /// Device connectivity as seen by the relay.
    #[serde(rename = "esp32_status")]
    DeviceStatus { connected: bool, message: String },

    /// A command could not be delivered.
    Error { message: String },
}

impl OutboundMsg {
    /// Status reply for a freshly classified browser, or for a device
    /// announcement (`connected = true`).
    pub fn device_status(connected: bool) -> Self {
        let message = if connected {
            DEVICE_CONNECTED
        } else {
            DEVICE_NOT_CONNECTED
        };
        OutboundMsg::DeviceStatus {
            connected,
            message: message.to_string(),
        }
    }

    /// Pushed to the browser when the registered device's socket ends.
    pub fn device_disconnected() -> Self {
        OutboundMsg::DeviceStatus {
            connected: false,
            message: DEVICE_DISCONNECTED.to_string(),
        }
    }

    /// Error returned to a browser whose command has nowhere to go.
    pub fn device_missing() -> Self {
        OutboundMsg::Error {
            message: DEVICE_NOT_CONNECTED.to_string(),
        }
    }

    /// Browser-facing rewording of a device's `{"result": bool}` report.
    pub fn movement_result(result: bool) -> Self {
        let message = if result {
            MOVEMENT_SUCCEEDED
        } else {
            MOVEMENT_FAILED
        };
        OutboundMsg::MovementResult {
            result,
            message: message.to_string(),
        }
    }

    /// Short name for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMsg::Pong => "pong",
            OutboundMsg::MovementResult { .. } => "movement_result",
            OutboundMsg::DeviceStatus { .. } => "esp32_status",
            OutboundMsg::Error { .. } => "error",
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pong_serializes_to_bare_type() {
        // Act
        let value = serde_json::to_value(OutboundMsg::Pong).unwrap();
        // Assert
        assert_eq!(value, json!({"type": "pong"}));
    }

    #[test]
    fn test_device_status_uses_esp32_status_tag() {
        let value = serde_json::to_value(OutboundMsg::device_status(true)).unwrap();
        assert_eq!(
            value,
            json!({"type": "esp32_status", "connected": true, "message": "ESP32 connected"})
        );
    }

    #[test]
    fn test_device_status_not_connected_text() {
        let value = serde_json::to_value(OutboundMsg::device_status(false)).unwrap();
        assert_eq!(value["connected"], json!(false));
        assert_eq!(value["message"], json!("ESP32 not connected"));
    }

    #[test]
    fn test_device_disconnected_message() {
        let value = serde_json::to_value(OutboundMsg::device_disconnected()).unwrap();
        assert_eq!(
            value,
            json!({"type": "esp32_status", "connected": false, "message": "ESP32 disconnected"})
        );
    }

    #[test]
    fn test_device_missing_is_error_envelope() {
        let value = serde_json::to_value(OutboundMsg::device_missing()).unwrap();
        assert_eq!(
            value,
            json!({"type": "error", "message": "ESP32 not connected"})
        );
    }

    #[test]
    fn test_movement_result_text_follows_boolean() {
        let ok = serde_json::to_value(OutboundMsg::movement_result(true)).unwrap();
        let failed = serde_json::to_value(OutboundMsg::movement_result(false)).unwrap();

        assert_eq!(ok["type"], json!("movement_result"));
        assert_eq!(ok["message"], json!("Movement completed successfully"));
        assert_eq!(failed["result"], json!(false));
        assert_eq!(failed["message"], json!("Movement failed"));
    }

    #[test]
    fn test_outbound_deserializes_from_browser_view() {
        // The browser page parses these frames; make sure the tag is what it expects.
        let msg: OutboundMsg =
            serde_json::from_str(r#"{"type":"esp32_status","connected":true,"message":"x"}"#)
                .unwrap();
        assert!(matches!(msg, OutboundMsg::DeviceStatus { connected: true, .. }));
    }

    #[test]
    fn test_envelope_kind_names() {
        assert_eq!(Envelope::DeviceAnnounce.kind(), "esp32_connected");
        assert_eq!(Envelope::Result(true).kind(), "result");
        assert_eq!(Envelope::Other.kind(), "other");
    }
}
