//! JSON wire protocol spoken with the transcription server.
//!
//! Every frame in either direction is one JSON object sent as a WebSocket
//! text message.  Outbound frames are [`Event`]s; inbound frames are decoded
//! by [`decode_inbound`].

pub mod event;
pub mod inbound;

use thiserror::Error;

pub use event::{unix_timestamp, Event};
pub use inbound::{decode_inbound, InboundMessage};

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The text is not valid JSON, or a value could not be serialized.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON is valid but is not an object.
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}
