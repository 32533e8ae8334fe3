//! System clipboard backed by `arboard`.
//!
//! A fresh `arboard::Clipboard` handle is opened for every call; on X11 the
//! clipboard contents are owned by the handle that set them.

use arboard::Error as ArboardError;

use crate::application::clipboard::{Clipboard, ClipboardError};

/// The operating system clipboard.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }

    fn open() -> Result<arboard::Clipboard, ClipboardError> {
        arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))
    }
}

impl Clipboard for SystemClipboard {
    fn read_text(&self) -> Result<String, ClipboardError> {
        Self::open()?.get_text().map_err(|e| match e {
            ArboardError::ContentNotAvailable => ClipboardError::NoText,
            other => ClipboardError::Access(other.to_string()),
        })
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        Self::open()?
            .set_text(text.to_owned())
            .map_err(|e| ClipboardError::Access(e.to_string()))
    }
}
