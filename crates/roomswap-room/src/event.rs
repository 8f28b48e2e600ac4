//! Terminal disconnect details.

use roomswap_protocol::RoomTarget;

/// Fallback message when a disconnect carries no details.
pub const UNSPECIFIED_DISCONNECT: &str = "Unspecified disconnect reason";

/// Details of a room connection that failed or ended.
///
/// Captured by the [`Room`](crate::Room) when it reaches a terminal state
/// and surfaced to observers so displays can tell the player what
/// happened and to which room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectEvent {
    /// The room the connection was aimed at, if known.
    pub target: Option<RoomTarget>,
    /// Human-readable description. Never empty; defaults to
    /// [`UNSPECIFIED_DISCONNECT`].
    pub message: String,
    /// `true` when the disconnect was requested by the local client
    /// (an explicit `disconnect()` call), as opposed to a network or
    /// matcher failure.
    pub initiated_locally: bool,
}

impl DisconnectEvent {
    /// A disconnect caused by the network or the matcher.
    pub fn remote(target: Option<RoomTarget>, message: Option<String>) -> Self {
        Self {
            target,
            message: message.unwrap_or_else(|| UNSPECIFIED_DISCONNECT.to_string()),
            initiated_locally: false,
        }
    }

    /// A disconnect requested by the local client.
    pub fn local(target: Option<RoomTarget>) -> Self {
        Self {
            target,
            message: "disconnect requested by the local client".to_string(),
            initiated_locally: true,
        }
    }

    /// Whether the affected room was a quickmatch room.
    pub fn is_quickmatch(&self) -> bool {
        self.target.as_ref().is_some_and(RoomTarget::is_quickmatch)
    }
}
