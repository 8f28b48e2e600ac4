//! Room connection lifecycle for Roomswap.
//!
//! A [`Room`] is one connection attempt to one multiplayer room: it owns a
//! background session task that speaks the matcher protocol, and a
//! state machine the owner drives by calling [`Room::tick`] every cycle.
//!
//! # Key types
//!
//! - [`Room`] — the connection object itself
//! - [`ConnectionState`] / [`StateChange`] — the lifecycle state machine
//!   and the events published to subscribers
//! - [`ConnectOptions`] / [`AppSettings`] — per-request configuration and
//!   the ambient defaults it is filled from
//! - [`DisconnectEvent`] — terminal details of a failed or closed room

mod error;
mod event;
mod options;
mod room;
mod state;

pub use error::RoomError;
pub use event::{DisconnectEvent, UNSPECIFIED_DISCONNECT};
pub use options::{AppSettings, ConnectOptions};
pub use room::Room;
pub use state::{ConnectionState, StateChange};
