//! # Roomswap
//!
//! Seamless room switching for realtime multiplayer clients.
//!
//! A client owns one [`Endpoint`] — the single active connection slot the
//! rest of the application sees. [`SeamlessRoomConnecter`] connects to a
//! new room in the background while the endpoint stays on its current
//! room, then swaps the finished connection in atomically, so switching
//! rooms never shows the player a disconnect.
//!
//! Everything is driven by an explicit per-cycle `tick(dt)` from a host
//! loop (pace one with `roomswap_frame::FrameClock`):
//!
//! ```rust,no_run
//! use roomswap::prelude::*;
//! use roomswap_transport::WebSocketConnector;
//!
//! # async fn run() -> Result<(), RoomswapError> {
//! let settings = AppSettings::new("my-app-key", "wss://matcher.example.net");
//! let endpoint = Endpoint::new(WebSocketConnector::new(), settings);
//! let mut connecter = SeamlessRoomConnecter::new(endpoint);
//!
//! connecter.connect_to_room("lobby")?;
//! // loop { connecter.tick(dt); ... }
//! # Ok(())
//! # }
//! ```

mod auto_reconnect;
mod connecter;
mod display;
mod endpoint;
mod error;
mod room_connector;

pub use auto_reconnect::AutoReconnect;
pub use connecter::{ConnecterEvent, SeamlessRoomConnecter};
pub use display::{
    EndpointStatusDisplay, SeamlessStatusDisplay, disconnect_display_name, room_display_name,
};
pub use endpoint::{Endpoint, EndpointEvent};
pub use error::RoomswapError;
pub use room_connector::RoomConnector;

/// Commonly used types, re-exported for `use roomswap::prelude::*`.
pub mod prelude {
    pub use crate::{
        AutoReconnect, ConnecterEvent, Endpoint, EndpointEvent, RoomConnector, RoomswapError,
        SeamlessRoomConnecter,
    };
    pub use roomswap_protocol::RoomTarget;
    pub use roomswap_room::{
        AppSettings, ConnectOptions, ConnectionState, DisconnectEvent, Room, StateChange,
    };
}
