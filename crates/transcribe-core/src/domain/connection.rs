//! Connection state of the network client.

use std::fmt;

/// Lifecycle of the single outbound connection.
///
/// ```text
/// Disconnected ──▶ Connecting ──▶ Connected
///      ▲               │              │
///      └───────────────┴──────────────┘  (error / close)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    /// Returns `true` only in the [`ConnectionState::Connected`] state.
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(name)
    }
}
