//! transcribe-controller library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the controller do? (for beginners)
//!
//! An operator transcribes audio while a remote transcription server does
//! the heavy lifting.  The controller is the local glue between the two:
//!
//! 1. Input sources (HTTP requests from the browser front end, new files in
//!    the scan folder, keyboard shortcuts) enqueue [`transcribe_core::Command`]s
//!    on the [`bus`].
//! 2. A single dispatcher turns each command into an outbound
//!    [`transcribe_core::Event`]: a transport update, a PDF submission, a
//!    transcription request.
//! 3. The network client keeps one WebSocket connection to the server alive,
//!    reconnecting with exponential backoff, and streams the events to it in
//!    order.
//! 4. Replies from the server (the finished transcription) land on the
//!    clipboard.
//!
//! ```text
//!  HTTP / watcher / hotkeys ──▶ command queue ──▶ Dispatcher ──▶ outbound queue ──▶ NetworkClient ──▶ server
//!                                                                                        │
//!                                                 clipboard ◀── InboundHandler ◀─────────┘
//! ```

/// The command and outbound queues plus the shutdown signal.
pub mod bus;

/// Application layer: dispatcher and use cases.
pub mod application;

/// Infrastructure layer: network, HTTP, watcher, clipboard, storage.
pub mod infrastructure;
