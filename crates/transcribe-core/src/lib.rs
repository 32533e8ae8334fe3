//! # transcribe-core
//!
//! Shared library for the transcription controller containing the command
//! vocabulary, the transport-state mirror, the reconnect backoff policy, and
//! the JSON wire protocol spoken with the transcription server.
//!
//! It has zero dependencies on OS APIs, async runtimes, or network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! The controller listens to several input sources (an HTTP endpoint, a
//! watched folder, keyboard shortcuts) and turns what they report into
//! messages for one remote server.  Everything flows through two queues:
//!
//! ```text
//! producers ──Command──▶ dispatcher ──Event──▶ network client ──JSON──▶ server
//! ```
//!
//! This crate defines the values that travel on those queues:
//!
//! - **`domain`** – What the controller can be asked to do ([`Command`]), the
//!   local audio transport mirror ([`TransportState`]), the connection state
//!   machine and the exponential [`Backoff`] used between reconnect attempts.
//!
//! - **`protocol`** – How those values look on the wire.  Outbound [`Event`]s
//!   are JSON objects with a `command` discriminator and a `timestamp`;
//!   inbound messages are decoded into [`InboundMessage`].

pub mod domain;
pub mod protocol;

pub use domain::backoff::{Backoff, BackoffPolicy};
pub use domain::command::{Command, CommandError, CommandKind};
pub use domain::connection::ConnectionState;
pub use domain::transport::TransportState;
pub use protocol::event::Event;
pub use protocol::inbound::{decode_inbound, InboundMessage};
pub use protocol::ProtocolError;
