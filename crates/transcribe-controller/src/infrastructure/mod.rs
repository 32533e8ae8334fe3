//! Infrastructure layer for the controller.
//!
//! Contains the OS-facing adapters: the WebSocket client, the HTTP trigger
//! endpoint, the submission-folder watcher, clipboard access and file-system
//! storage.
//!
//! **Dependency rule**: this layer may depend on `application`, `bus` and
//! `transcribe_core`; the domain crate never depends on it.

pub mod clipboard;
pub mod http_api;
pub mod network;
pub mod pdf_watcher;
pub mod storage;
