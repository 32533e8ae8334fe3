//! Clipboard abstraction used by the export commands.
//!
//! The dispatcher reads the operator's edited transcription from the
//! clipboard (`export-save`) and the inbound handler writes the server's
//! transcription to it.  Both depend only on this trait; the system
//! implementation lives in `infrastructure::clipboard`.

use thiserror::Error;

/// Error type for clipboard operations.
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// No clipboard could be opened (no display server, headless session).
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    /// The clipboard holds no text (empty, or an image).
    #[error("clipboard does not contain text")]
    NoText,
    /// Reading or writing failed after the clipboard was opened.
    #[error("clipboard access failed: {0}")]
    Access(String),
}

/// Plain-text clipboard access.
///
/// Implementations must be callable from any task; the system clipboard is
/// opened per call.
#[cfg_attr(test, mockall::automock)]
pub trait Clipboard: Send + Sync {
    /// Returns the current clipboard text.
    fn read_text(&self) -> Result<String, ClipboardError>;

    /// Replaces the clipboard contents with `text`.
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}
