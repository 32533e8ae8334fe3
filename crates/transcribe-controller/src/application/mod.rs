//! Application layer use cases for the controller.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure rules in `transcribe-core`) and the infrastructure (sockets,
//! clipboard, file system).  Code here orchestrates domain objects and
//! depends on traits such as [`clipboard::Clipboard`] rather than on
//! concrete OS adapters, so every use case can be unit-tested with doubles.
//!
//! # Sub-modules
//!
//! - **`dispatcher`**     – The single consumer of the command queue.  Owns
//!   the transport mirror and the user id; turns commands into events.
//! - **`pdf_submission`** – Finds PDFs in the submission folder and converts
//!   them to `submit_pdf` events.
//! - **`inbound`**        – Reacts to messages pushed by the server (copies
//!   transcriptions to the clipboard).
//! - **`clipboard`**      – The clipboard abstraction both of the above use.

pub mod clipboard;
pub mod dispatcher;
pub mod inbound;
pub mod pdf_submission;
