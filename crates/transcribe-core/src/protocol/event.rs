//! Outbound events.
//!
//! An [`Event`] is a JSON object that always carries a `command`
//! discriminator and a `timestamp` (float seconds since the Unix epoch).
//! Everything else is command-specific and kept in an ordered map so the
//! network layer never needs to know the individual shapes.
//!
//! ```json
//! {"command": "play_pause", "timestamp": 1700000000.25,
//!  "state": {"is_playing": true, "current_file": "audio.mp3", "position": 0, "duration": 180}}
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::ProtocolError;
use crate::domain::transport::TransportState;

/// Command names understood by the transcription server.
pub mod names {
    pub const SUBMIT_PDF: &str = "submit_pdf";
    pub const PLAY_PAUSE: &str = "play_pause";
    pub const BACKWARD_AUDIO: &str = "backward_audio";
    pub const FORWARD_AUDIO: &str = "forward_audio";
    pub const PREVIOUS_AUDIO: &str = "previous_audio";
    pub const NEXT_AUDIO: &str = "next_audio";
    pub const GET_TRANSCRIPTION: &str = "get_transcription";
    pub const SAVE_EDITED_TRANSCRIPTION: &str = "save_edited_transcription";
}

/// Keys owned by [`Event`] itself; [`Event::with_field`] refuses them.
const RESERVED_KEYS: [&str; 2] = ["command", "timestamp"];

/// Returns the current wall-clock time as float seconds since the Unix epoch.
///
/// A clock set before 1970 yields `0.0` instead of panicking.
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// One outbound message for the transcription server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub command: String,
    pub timestamp: f64,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Event {
    /// Creates an event stamped with the current time.
    pub fn new(command: impl Into<String>) -> Self {
        Self::at(command, unix_timestamp())
    }

    /// Creates an event with an explicit timestamp.
    pub fn at(command: impl Into<String>, timestamp: f64) -> Self {
        Self {
            command: command.into(),
            timestamp,
            fields: Map::new(),
        }
    }

    /// Adds a command-specific key, replacing any previous value.
    ///
    /// `command` and `timestamp` are reserved; attempts to set them are
    /// logged and ignored.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            warn!("ignoring reserved event key '{key}' on '{}'", self.command);
            return self;
        }
        self.fields.insert(key, value.into());
        self
    }

    /// Returns a command-specific value.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Iterates over the command-specific keys in key order.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Serializes the event into a single JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Json`] if a field value cannot be serialized.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses an event back from JSON (used by servers and tests).
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Json`] if the text is not a valid event.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    // ── Typed constructors ────────────────────────────────────────────────────

    /// A PDF submission: the file bytes hex-encoded plus the file name.
    pub fn submit_pdf(filename: &str, data: &[u8]) -> Self {
        Self::new(names::SUBMIT_PDF)
            .with_field("pdf_data", hex::encode(data))
            .with_field("pdf_filename", filename)
    }

    /// A transport event carrying the full transport snapshot as `state`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Json`] if the state cannot be converted to JSON.
    pub fn transport(command: &str, state: &TransportState) -> Result<Self, ProtocolError> {
        let state = serde_json::to_value(state)?;
        Ok(Self::new(command).with_field("state", state))
    }

    /// Asks the server to send back the current transcription.
    pub fn get_transcription() -> Self {
        Self::new(names::GET_TRANSCRIPTION)
    }

    /// Sends an edited transcription back to the server.
    pub fn save_edited_transcription(content: impl Into<String>) -> Self {
        Self::new(names::SAVE_EDITED_TRANSCRIPTION)
            .with_field("edited_transcription_content", content.into())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_always_contains_command_and_timestamp() {
        // Arrange
        let event = Event::at("get_transcription", 1_700_000_000.5);

        // Act
        let value: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();

        // Assert
        assert_eq!(value["command"], "get_transcription");
        assert_eq!(value["timestamp"], 1_700_000_000.5);
        assert_eq!(value.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_extra_fields_are_flattened_into_the_object() {
        let event = Event::at("submit_pdf", 1.0)
            .with_field("pdf_filename", "a.pdf")
            .with_field("pages", 3);

        let value: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();

        assert_eq!(value["pdf_filename"], "a.pdf");
        assert_eq!(value["pages"], 3);
    }

    #[test]
    fn test_reserved_keys_cannot_be_overwritten() {
        let event = Event::at("play_pause", 2.0)
            .with_field("command", "hijack")
            .with_field("timestamp", 0);

        assert_eq!(event.command, "play_pause");
        assert_eq!(event.timestamp, 2.0);
        assert_eq!(event.fields().count(), 0);
    }

    #[test]
    fn test_submit_pdf_hex_encodes_bytes() {
        let event = Event::submit_pdf("scan.pdf", b"%PDF");

        assert_eq!(event.command, names::SUBMIT_PDF);
        assert_eq!(event.field("pdf_data"), Some(&Value::from("25504446")));
        assert_eq!(event.field("pdf_filename"), Some(&Value::from("scan.pdf")));
    }

    #[test]
    fn test_transport_event_embeds_state_object() {
        let mut state = TransportState::default();
        state.toggle();

        let event = Event::transport(names::PLAY_PAUSE, &state).unwrap();

        let json = event.field("state").unwrap();
        assert_eq!(json["is_playing"], true);
        assert_eq!(json["duration"], 180);
    }

    #[test]
    fn test_save_edited_transcription_carries_content() {
        let event = Event::save_edited_transcription("fixed text");
        assert_eq!(
            event.field("edited_transcription_content"),
            Some(&Value::from("fixed text"))
        );
    }

    #[test]
    fn test_from_json_recovers_command_and_fields() {
        let text = r#"{"command":"next_audio","timestamp":5.0,"user_id":"op-7"}"#;

        let event = Event::from_json(text).unwrap();

        assert_eq!(event.command, "next_audio");
        assert_eq!(event.timestamp, 5.0);
        assert_eq!(event.field("user_id"), Some(&Value::from("op-7")));
    }

    #[test]
    fn test_new_uses_current_time() {
        let before = unix_timestamp();
        let event = Event::new("x");
        assert!(event.timestamp >= before);
        assert!(event.timestamp > 1_600_000_000.0);
    }
}
