//! Clipboard infrastructure.
//!
//! - `system` – The real OS clipboard via `arboard` (Windows, macOS, X11 and
//!   Wayland).
//! - `mock`   – An in-memory clipboard for tests and headless runs.
//!
//! Both implement [`crate::application::clipboard::Clipboard`].

pub mod mock;
pub mod system;
