//! Network infrastructure: the duplex WebSocket link to the transcription
//! server.
//!
//! Architecture:
//! - [`ws_client::NetworkClient`] owns at most one live connection.
//! - A *connection task* connects, reconnects with exponential backoff, and
//!   reads inbound frames for as long as the connection lives.
//! - A *send task* drains the outbound queue into whichever connection is
//!   currently live; while disconnected, events stay queued.

use std::time::Duration;

use thiserror::Error;
use tokio_tungstenite::tungstenite;
use transcribe_core::BackoffPolicy;

pub mod ws_client;

pub use ws_client::{NetworkClient, NetworkTasks};

/// Errors that can occur in the network layer.
///
/// None of them is fatal: the connection task logs them and reconnects.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The WebSocket handshake failed.
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },
    /// The handshake did not complete within the configured limit.
    #[error("connecting to {url} timed out after {timeout:?}")]
    ConnectTimeout { url: String, timeout: Duration },
    /// Writing a frame to the live connection failed.
    #[error("failed to send frame: {0}")]
    Send(#[source] tungstenite::Error),
    /// Reading from the live connection failed.
    #[error("failed to read frame: {0}")]
    Receive(#[source] tungstenite::Error),
    /// The connection ended (close frame, EOF, or dropped after a failed send).
    #[error("connection closed")]
    Closed,
}

/// Configuration for [`NetworkClient`].
#[derive(Debug, Clone)]
pub struct NetworkClientConfig {
    /// `ws://` or `wss://` URL of the transcription server.
    pub url: String,
    /// Reconnect delay policy.
    pub backoff: BackoffPolicy,
    /// Limit for a single connection attempt.
    pub connect_timeout: Duration,
}

impl Default for NetworkClientConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:6790".to_string(),
            backoff: BackoffPolicy::default(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}
