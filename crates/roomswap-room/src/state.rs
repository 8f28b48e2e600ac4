//! The room connection state machine.

use serde::{Deserialize, Serialize};

/// The lifecycle state of a room connection.
///
/// A successful attempt moves strictly forward:
///
/// ```text
/// Disconnected → ConnectingToServer → JoiningRoom → Ready
/// ```
///
/// Any non-Ready state can fall to `Error` (the attempt failed) and a
/// `Ready` room can fall to `Disconnected` (the established connection
/// ended). Both are terminal: a `Room` is single-use and a new attempt
/// needs a new `Room`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Initial state, and terminal state after an established connection
    /// ends.
    Disconnected,
    /// The transport connection to the matcher is being established.
    ConnectingToServer,
    /// The matcher has been reached; waiting for the join to resolve.
    JoiningRoom,
    /// Connected and joined. The room can carry traffic.
    Ready,
    /// The connection attempt failed.
    Error,
}

impl ConnectionState {
    /// Returns `true` while a connection attempt is underway.
    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::ConnectingToServer | Self::JoiningRoom)
    }

    /// Returns `true` for the two failure/closure states.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Error)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::ConnectingToServer => write!(f, "ConnectingToServer"),
            Self::JoiningRoom => write!(f, "JoiningRoom"),
            Self::Ready => write!(f, "Ready"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// A single transition of a room's [`ConnectionState`], published to
/// subscribers from [`Room::tick`](crate::Room::tick).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    /// The state the room left.
    pub previous: ConnectionState,
    /// The state the room entered.
    pub current: ConnectionState,
}
