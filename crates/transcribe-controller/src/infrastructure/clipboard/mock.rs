//! In-memory clipboard for tests that need a real (non-mock) clipboard,
//! such as the dispatcher pipeline tests.

use std::sync::Mutex;

use crate::application::clipboard::{Clipboard, ClipboardError};

/// A clipboard that lives in process memory and records every write.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    content: Mutex<Option<String>>,
    writes: Mutex<Vec<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clipboard that already holds `text`.
    pub fn with_text(text: &str) -> Self {
        Self {
            content: Mutex::new(Some(text.to_string())),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Every string passed to [`Clipboard::write_text`], in call order.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

impl Clipboard for MemoryClipboard {
    fn read_text(&self) -> Result<String, ClipboardError> {
        self.content
            .lock()
            .map_err(|e| ClipboardError::Access(e.to_string()))?
            .clone()
            .ok_or(ClipboardError::NoText)
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        *self
            .content
            .lock()
            .map_err(|e| ClipboardError::Access(e.to_string()))? = Some(text.to_string());
        self.writes
            .lock()
            .map_err(|e| ClipboardError::Access(e.to_string()))?
            .push(text.to_string());
        Ok(())
    }
}
