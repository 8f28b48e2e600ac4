//! Room identity and matcher message types.
//!
//! Every type here travels on the wire between a client and the matcher
//! service, so the serde attributes define the exact JSON shapes.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomTarget — what a connection request is aimed at
// ---------------------------------------------------------------------------

/// The destination of a room connection.
///
/// A target is either a private room addressed by its logical name, a
/// specific quickmatch room addressed by group + code, or a quickmatch
/// group where the matcher picks (or creates) the next available room.
///
/// A `QuickmatchGroup` target is what a client *requests*; the matcher
/// resolves it to a concrete `Quickmatch` target in its
/// [`MatcherResponse::Joined`] reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RoomTarget {
    /// A private room with a caller-chosen name.
    Room { name: String },

    /// A specific quickmatch room, addressed by group and room code.
    Quickmatch { group: String, code: String },

    /// Matchmaking: the next available room in a group.
    QuickmatchGroup { group: String },
}

impl RoomTarget {
    /// The room name, for [`RoomTarget::Room`] targets.
    pub fn room_name(&self) -> Option<&str> {
        match self {
            Self::Room { name } => Some(name),
            _ => None,
        }
    }

    /// The quickmatch group, for both quickmatch target kinds.
    pub fn quickmatch_group(&self) -> Option<&str> {
        match self {
            Self::Quickmatch { group, .. } | Self::QuickmatchGroup { group } => Some(group),
            Self::Room { .. } => None,
        }
    }

    /// The quickmatch room code, once known.
    pub fn quickmatch_code(&self) -> Option<&str> {
        match self {
            Self::Quickmatch { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Returns `true` for both quickmatch target kinds.
    pub fn is_quickmatch(&self) -> bool {
        !matches!(self, Self::Room { .. })
    }
}

impl fmt::Display for RoomTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Room { name } => write!(f, "room {name}"),
            Self::Quickmatch { group, code } => write!(f, "quickmatch {group}-{code}"),
            Self::QuickmatchGroup { group } => write!(f, "quickmatch group {group}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Matcher messages
// ---------------------------------------------------------------------------

/// Client → matcher messages.
///
/// The three connect variants each carry the resolved `app_key` — the
/// matcher authenticates every request independently, there is no separate
/// handshake round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MatcherRequest {
    /// Join (or create) a private room by name.
    JoinRoom { app_key: String, room_name: String },

    /// Join a specific quickmatch room by group and code.
    JoinQuickmatch {
        app_key: String,
        group: String,
        code: String,
    },

    /// Find or create the next available quickmatch room in a group.
    /// `capacity` is the max player count if the matcher creates a room.
    Matchmake {
        app_key: String,
        group: String,
        capacity: u32,
    },

    /// Keep-alive ping. `client_time` is milliseconds of client session
    /// time, echoed back in [`MatcherResponse::Pong`].
    Heartbeat { client_time: u64 },

    /// Graceful goodbye before closing the connection.
    Leave,
}

/// Matcher → client messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MatcherResponse {
    /// The join succeeded. `target` is the concrete room the client is in —
    /// for a [`MatcherRequest::Matchmake`] request this carries the room
    /// code the matcher picked.
    Joined { target: RoomTarget },

    /// Keep-alive reply, echoing the client's timestamp.
    Pong { client_time: u64 },

    /// The join was refused. `code` follows HTTP-style conventions.
    Rejected { code: u16, message: String },

    /// The client was removed from an established room (room closed,
    /// kicked, capacity rebalance).
    Evicted { message: String },
}

// =========================================================================
// Tests
// =========================================================================
