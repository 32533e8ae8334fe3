//! Domain layer: pure value types with no I/O.
//!
//! # What belongs in the domain layer?
//!
//! - The command vocabulary understood by the dispatcher
//! - The audio transport mirror the dispatcher mutates
//! - The connection state machine and its reconnect backoff
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, channel, or WebSocket types
//! - File or clipboard access

pub mod backoff;
pub mod command;
pub mod connection;
pub mod transport;

pub use backoff::{Backoff, BackoffPolicy};
pub use command::{Command, CommandError, CommandKind};
pub use connection::ConnectionState;
pub use transport::TransportState;
