//! In-process transport over unbounded channels.
//!
//! Used by tests and demos that run a matcher stub inside the same
//! process. [`memory_pair`] returns a connector for the client side and a
//! listener the stub accepts connections from; each [`MemoryConnector::dial`]
//! produces a crossed pair of [`MemoryConnection`] halves.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc};

use crate::{Connection, ConnectionId, Connector, TransportError};

/// Counter for generating unique connection IDs, shared with no other
/// transport so IDs are only unique within the memory transport.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Creates a connected connector/listener pair.
pub fn memory_pair() -> (MemoryConnector, MemoryListener) {
    let (dial_tx, dial_rx) = mpsc::unbounded_channel();
    (
        MemoryConnector { dials: dial_tx },
        MemoryListener { incoming: dial_rx },
    )
}

/// The client side of an in-memory transport. Cloneable; every clone
/// dials into the same listener.
#[derive(Clone)]
pub struct MemoryConnector {
    dials: mpsc::UnboundedSender<MemoryConnection>,
}

impl Connector for MemoryConnector {
    type Connection = MemoryConnection;
    type Error = TransportError;

    async fn dial(&self, url: &str) -> Result<Self::Connection, Self::Error> {
        let (client, server) = connection_pair();
        tracing::debug!(id = %client.id, url, "dialed in-memory connection");
        self.dials.send(server).map_err(|_| {
            TransportError::DialFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "memory listener dropped",
            ))
        })?;
        Ok(client)
    }
}

/// The accept side of an in-memory transport.
pub struct MemoryListener {
    incoming: mpsc::UnboundedReceiver<MemoryConnection>,
}

impl MemoryListener {
    /// Waits for the next dialed connection. Returns `None` once every
    /// connector clone has been dropped.
    pub async fn accept(&mut self) -> Option<MemoryConnection> {
        self.incoming.recv().await
    }
}

/// One half of an in-memory duplex connection.
#[derive(Debug)]
pub struct MemoryConnection {
    id: ConnectionId,
    /// `None` after close; dropping the sender is what signals EOF to
    /// the peer's `recv`.
    tx: Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    rx: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

fn connection_pair() -> (MemoryConnection, MemoryConnection) {
    let (a_tx, a_rx) = mpsc::unbounded_channel();
    let (b_tx, b_rx) = mpsc::unbounded_channel();
    let client = MemoryConnection {
        id: ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed)),
        tx: Mutex::new(Some(a_tx)),
        rx: Mutex::new(b_rx),
    };
    let server = MemoryConnection {
        id: ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed)),
        tx: Mutex::new(Some(b_tx)),
        rx: Mutex::new(a_rx),
    };
    (client, server)
}

impl Connection for MemoryConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let tx = self.tx.lock().await;
        let Some(tx) = tx.as_ref() else {
            return Err(TransportError::ConnectionClosed("closed locally".into()));
        };
        tx.send(data.to_vec())
            .map_err(|_| TransportError::ConnectionClosed("peer dropped".into()))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self.rx.lock().await.recv().await)
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.tx.lock().await.take();
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
