//! Transport abstraction layer for Roomswap.
//!
//! Provides the [`Connector`] and [`Connection`] traits that abstract over
//! how a client reaches the matcher service. A room dials one outbound
//! connection per connection attempt and owns it for the life of the room.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket connector via `tokio-tungstenite`
//!
//! The [`memory`] module provides an in-process transport for tests and
//! demos that run their own matcher stub.
//!
//! Trait methods return `impl Future + Send` rather than using bare
//! `async fn` — room session tasks are spawned onto the Tokio runtime,
//! so the futures must be provably `Send`.

mod error;
mod memory;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use memory::{MemoryConnection, MemoryConnector, MemoryListener, memory_pair};
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketConnector};

use std::fmt;
use std::future::Future;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Dials outbound connections to a matcher service.
///
/// A connector is shared (behind `Arc`) between every room a client
/// creates, so it must be stateless or internally synchronized.
pub trait Connector: Send + Sync + 'static {
    /// The connection type produced by this connector.
    type Connection: Connection;
    /// The error type for dial operations.
    type Error: std::error::Error + Send + Sync;

    /// Opens a new connection to the service at `url`.
    fn dial(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send;
}

/// A single established connection that can send and receive messages.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends a message to the remote peer.
    fn send(&self, data: &[u8]) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receives the next message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(&self) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnectionId::new(1), "matcher-eu");
        map.insert(ConnectionId::new(2), "matcher-us");
        assert_eq!(map[&ConnectionId::new(1)], "matcher-eu");
    }
}
