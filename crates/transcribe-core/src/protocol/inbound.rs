//! Inbound messages from the transcription server.
//!
//! The server pushes many kinds of JSON objects; the controller reacts to
//! exactly one of them, the reply to a `get_transcription` request:
//!
//! ```json
//! {"type": "frontend_response", "command": "get_transcription", "transcription": "..."}
//! ```
//!
//! Every other well-formed object is surfaced as [`InboundMessage::Other`] so
//! the receive loop can log it.

use serde_json::Value;

use super::event::names;
use super::ProtocolError;

const FRONTEND_RESPONSE: &str = "frontend_response";

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// The server answered a transcription request.
    ///
    /// `text` is empty when the server had no transcription to offer.
    Transcription { text: String },
    /// Any other JSON object.
    Other(Value),
}

/// Decodes one text frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Json`] for malformed JSON and
/// [`ProtocolError::NotAnObject`] for valid JSON that is not an object.
///
/// # Examples
///
/// ```rust
/// use transcribe_core::{decode_inbound, InboundMessage};
///
/// let msg = decode_inbound(
///     r#"{"type":"frontend_response","command":"get_transcription","transcription":"hi"}"#,
/// ).unwrap();
/// assert_eq!(msg, InboundMessage::Transcription { text: "hi".into() });
/// ```
pub fn decode_inbound(text: &str) -> Result<InboundMessage, ProtocolError> {
    let value: Value = serde_json::from_str(text)?;

    let Some(object) = value.as_object() else {
        return Err(ProtocolError::NotAnObject(json_kind(&value)));
    };

    let is_transcription_reply = object.get("type").and_then(Value::as_str)
        == Some(FRONTEND_RESPONSE)
        && object.get("command").and_then(Value::as_str) == Some(names::GET_TRANSCRIPTION);

    if is_transcription_reply {
        let text = object
            .get("transcription")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Ok(InboundMessage::Transcription { text });
    }

    Ok(InboundMessage::Other(value))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
