//! The plain, non-seamless room connector.
//!
//! Disconnects the endpoint first and connects directly, so the player
//! watches the connection happen. Useful for menus and first joins where
//! there is nothing to stay connected to; for in-session switching use
//! [`SeamlessRoomConnecter`](crate::SeamlessRoomConnecter).

use roomswap_room::{ConnectOptions, Room};
use roomswap_transport::Connector;

use crate::{Endpoint, RoomswapError};

/// Connects an [`Endpoint`] to rooms directly, with the same duplicate
/// guards as the seamless connecter but no background connection.
#[derive(Debug, Clone)]
pub struct RoomConnector {
    /// The quickmatch room group used by [`quickmatch`](Self::quickmatch).
    pub quickmatch_group_name: String,

    /// Max player count when matchmaking creates a new quickmatch room.
    pub quickmatch_room_capacity: u32,
}

impl Default for RoomConnector {
    fn default() -> Self {
        Self {
            quickmatch_group_name: "default".to_string(),
            quickmatch_room_capacity: 16,
        }
    }
}

impl RoomConnector {
    /// Connects to a room by name, disconnecting the current room first.
    pub fn connect_to_room<C: Connector>(
        &self,
        endpoint: &mut Endpoint<C>,
        room_name: &str,
    ) -> Result<(), RoomswapError> {
        if !endpoint.disconnected() && endpoint.room().and_then(Room::name) == Some(room_name) {
            tracing::info!(
                room_name,
                "already connecting or connected, ignoring the connect call"
            );
            return Ok(());
        }

        if endpoint.connected() {
            endpoint.disconnect();
        }
        endpoint.connect(room_name, ConnectOptions::default())
    }

    /// Connects to a specific quickmatch room in the configured group,
    /// disconnecting the current room first.
    pub fn connect_directly_to_quickmatch_room<C: Connector>(
        &self,
        endpoint: &mut Endpoint<C>,
        room_code: &str,
    ) -> Result<(), RoomswapError> {
        let group = self.quickmatch_group_name.as_str();
        let duplicate = !endpoint.disconnected()
            && endpoint.room().is_some_and(|room| {
                room.quickmatch_room_group_name() == Some(group)
                    && room.quickmatch_room_code() == Some(room_code)
            });
        if duplicate {
            tracing::info!(
                group,
                room_code,
                "already connecting or connected, ignoring the quickmatch call"
            );
            return Ok(());
        }

        if endpoint.connected() {
            endpoint.disconnect();
        }
        endpoint.connect_directly_to_quickmatch_room(group, room_code, ConnectOptions::default())
    }

    /// Matchmakes into the configured quickmatch group.
    pub fn quickmatch<C: Connector>(
        &self,
        endpoint: &mut Endpoint<C>,
    ) -> Result<(), RoomswapError> {
        endpoint.connect_to_next_available_quickmatch_room(
            &self.quickmatch_group_name,
            self.quickmatch_room_capacity,
            ConnectOptions::default(),
        )
    }
}
