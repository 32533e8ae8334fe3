//! Handling of messages pushed by the transcription server.
//!
//! Inbound traffic bypasses the command queue: the network client's receive
//! loop hands every decoded message straight to an [`InboundHandler`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};
use transcribe_core::InboundMessage;

use super::clipboard::Clipboard;

/// Consumer of decoded server messages.
///
/// Infrastructure drives it; tests substitute a recording implementation.
#[async_trait]
pub trait InboundHandler: Send + Sync {
    async fn handle(&self, message: InboundMessage);
}

/// Copies transcription replies to the clipboard and ignores everything else.
pub struct ClipboardResponder {
    clipboard: Arc<dyn Clipboard>,
}

impl ClipboardResponder {
    pub fn new(clipboard: Arc<dyn Clipboard>) -> Self {
        Self { clipboard }
    }
}

#[async_trait]
impl InboundHandler for ClipboardResponder {
    async fn handle(&self, message: InboundMessage) {
        match message {
            InboundMessage::Transcription { text } if text.is_empty() => {
                warn!("server returned an empty transcription; clipboard left unchanged");
            }
            InboundMessage::Transcription { text } => match self.clipboard.write_text(&text) {
                Ok(()) => info!("transcription copied to clipboard ({} chars)", text.chars().count()),
                Err(e) => error!("failed to copy transcription to clipboard: {e}"),
            },
            InboundMessage::Other(value) => {
                debug!("ignoring server message: {value}");
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
