//! Wire codec: raw frame text ↔ [`Envelope`] / [`OutboundMsg`].
//!
//! Decoding is structural.  The frame must be a JSON object; after that the
//! first matching rule decides the envelope:
//!
//! | Rule                               | Envelope         |
//! |------------------------------------|------------------|
//! | `"type": "esp32_connected"`        | `DeviceAnnounce` |
//! | `"type": "ping"`                   | `Ping`           |
//! | both `row` and `col` present       | `Position`       |
//! | `result` holding a boolean         | `Result`         |
//! | anything else                      | `Other`          |
//!
//! A `result` that is not a boolean is not an outcome report, so it falls
//! through to `Other` like any other unrecognised object.
//!
//! A decode failure is never fatal: the supervisor logs it and keeps the
//! socket open.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::messages::{Envelope, OutboundMsg, PositionCommand};

const DEVICE_ANNOUNCE_TYPE: &str = "esp32_connected";
const PING_TYPE: &str = "ping";

/// Errors produced while decoding an inbound frame or encoding an outbound one.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The frame is not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// The frame is valid JSON but not an object (e.g. `[1, 2]` or `"hi"`).
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// A binary frame that is not UTF-8 text.
    #[error("binary frame is not UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// An outbound message could not be serialized.
    #[error("failed to encode outbound message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Parses one text frame into an [`Envelope`].
///
/// # Errors
///
/// Returns [`CodecError::InvalidJson`] for unparsable text and
/// [`CodecError::NotAnObject`] for non-object JSON.
///
/// # Example
///
/// ```rust
/// use esp32_relay::application::codec::decode;
/// use esp32_relay::domain::Envelope;
///
/// assert_eq!(decode(r#"{"type":"ping"}"#).unwrap(), Envelope::Ping);
/// assert!(decode("{not json").is_err());
/// ```
pub fn decode(raw: &str) -> Result<Envelope, CodecError> {
    let value: Value = serde_json::from_str(raw).map_err(CodecError::InvalidJson)?;
    match value {
        Value::Object(fields) => Ok(classify_fields(raw, &fields)),
        other => Err(CodecError::NotAnObject(json_type_name(&other))),
    }
}

/// Parses a binary frame by treating its payload as UTF-8 text.
///
/// # Errors
///
/// [`CodecError::InvalidUtf8`] if the payload is not text, otherwise the
/// same errors as [`decode`].
pub fn decode_bytes(raw: &[u8]) -> Result<Envelope, CodecError> {
    let text = std::str::from_utf8(raw)?;
    decode(text)
}

/// Serializes a relay-originated message to frame text.
///
/// # Errors
///
/// [`CodecError::Encode`] if serialization fails, which does not happen for
/// any [`OutboundMsg`] the relay constructs.
pub fn encode(msg: &OutboundMsg) -> Result<String, CodecError> {
    serde_json::to_string(msg).map_err(CodecError::Encode)
}

fn classify_fields(raw: &str, fields: &Map<String, Value>) -> Envelope {
    match fields.get("type").and_then(Value::as_str) {
        Some(DEVICE_ANNOUNCE_TYPE) => return Envelope::DeviceAnnounce,
        Some(PING_TYPE) => return Envelope::Ping,
        _ => {}
    }

    if let (Some(row), Some(col)) = (fields.get("row"), fields.get("col")) {
        return Envelope::Position(PositionCommand {
            raw: raw.to_string(),
            row: row.clone(),
            col: col.clone(),
        });
    }

    match fields.get("result").and_then(Value::as_bool) {
        Some(flag) => Envelope::Result(flag),
        None => Envelope::Other,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_device_announce() {
        let env = decode(r#"{"type":"esp32_connected"}"#).unwrap();
        assert_eq!(env, Envelope::DeviceAnnounce);
    }

    #[test]
    fn test_decode_ping_ignores_extra_fields() {
        let env = decode(r#"{"type":"ping","seq":7}"#).unwrap();
        assert_eq!(env, Envelope::Ping);
    }

    #[test]
    fn test_decode_position_keeps_raw_text() {
        // Arrange: odd spacing and an extra field must survive untouched
        let raw = r#"{ "row": 3, "col":4, "speed": "slow" }"#;

        // Act
        let env = decode(raw).unwrap();

        // Assert
        match env {
            Envelope::Position(cmd) => {
                assert_eq!(cmd.raw, raw);
                assert_eq!(cmd.row, json!(3));
                assert_eq!(cmd.col, json!(4));
            }
            other => panic!("expected Position, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_row_without_col_is_other() {
        let env = decode(r#"{"row":3}"#).unwrap();
        assert_eq!(env, Envelope::Other);
    }

    #[test]
    fn test_decode_type_takes_precedence_over_position() {
        let env = decode(r#"{"type":"ping","row":1,"col":2}"#).unwrap();
        assert_eq!(env, Envelope::Ping);
    }

    #[test]
    fn test_decode_result_true_and_false() {
        assert_eq!(decode(r#"{"result":true}"#).unwrap(), Envelope::Result(true));
        assert_eq!(decode(r#"{"result":false}"#).unwrap(), Envelope::Result(false));
    }

    #[test]
    fn test_decode_non_boolean_result_is_other() {
        assert_eq!(decode(r#"{"result":"yes"}"#).unwrap(), Envelope::Other);
        assert_eq!(decode(r#"{"result":null}"#).unwrap(), Envelope::Other);
        assert_eq!(decode(r#"{"result":1}"#).unwrap(), Envelope::Other);
    }

    #[test]
    fn test_decode_unknown_type_is_other() {
        assert_eq!(decode(r#"{"type":"hello"}"#).unwrap(), Envelope::Other);
        assert_eq!(decode("{}").unwrap(), Envelope::Other);
    }

    #[test]
    fn test_decode_malformed_json_fails() {
        let err = decode("{not json").unwrap_err();
        assert!(matches!(err, CodecError::InvalidJson(_)));
    }

    #[test]
    fn test_decode_non_object_fails() {
        let err = decode("[1,2]").unwrap_err();
        assert!(matches!(err, CodecError::NotAnObject("an array")));
        assert_eq!(err.to_string(), "expected a JSON object, got an array");
    }

    #[test]
    fn test_decode_bytes_accepts_utf8() {
        let env = decode_bytes(br#"{"type":"ping"}"#).unwrap();
        assert_eq!(env, Envelope::Ping);
    }

    #[test]
    fn test_decode_bytes_rejects_invalid_utf8() {
        let err = decode_bytes(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, CodecError::InvalidUtf8(_)));
    }

    #[test]
    fn test_encode_pong() {
        assert_eq!(encode(&OutboundMsg::Pong).unwrap(), r#"{"type":"pong"}"#);
    }

    #[test]
    fn test_encode_error_field_order() {
        let text = encode(&OutboundMsg::device_missing()).unwrap();
        assert_eq!(text, r#"{"type":"error","message":"ESP32 not connected"}"#);
    }
}
