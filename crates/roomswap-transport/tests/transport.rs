//! Integration tests for the transport layer.
//!
//! The memory transport tests are fully deterministic. The WebSocket
//! tests spin up a real tokio-tungstenite server on a loopback port to
//! verify data actually flows over the network.

use roomswap_transport::{Connection, Connector, TransportError, memory_pair};

// =========================================================================
// Memory transport
// =========================================================================

#[tokio::test]
async fn test_memory_dial_send_receive() {
    let (connector, mut listener) = memory_pair();

    let client = connector.dial("mem://matcher").await.expect("dial");
    let server = listener.accept().await.expect("accept");

    client.send(b"join please").await.expect("send");
    let received = server.recv().await.expect("recv").expect("data");
    assert_eq!(received, b"join please");

    server.send(b"welcome").await.expect("send");
    let received = client.recv().await.expect("recv").expect("data");
    assert_eq!(received, b"welcome");
}

#[tokio::test]
async fn test_memory_connection_ids_are_unique() {
    let (connector, mut listener) = memory_pair();
    let a = connector.dial("mem://matcher").await.unwrap();
    let b = connector.dial("mem://matcher").await.unwrap();
    let _ = listener.accept().await.unwrap();
    let _ = listener.accept().await.unwrap();
    assert_ne!(a.id(), b.id());
}

#[tokio::test]
async fn test_memory_close_signals_eof_to_peer() {
    let (connector, mut listener) = memory_pair();
    let client = connector.dial("mem://matcher").await.unwrap();
    let server = listener.accept().await.unwrap();

    client.close().await.unwrap();

    let result = server.recv().await.expect("recv should not error");
    assert!(result.is_none(), "peer close should read as EOF");

    // Sending after a local close fails.
    let err = client.send(b"late").await.unwrap_err();
    assert!(matches!(err, TransportError::ConnectionClosed(_)));
}

#[tokio::test]
async fn test_memory_dial_fails_after_listener_dropped() {
    let (connector, listener) = memory_pair();
    drop(listener);
    let err = connector.dial("mem://matcher").await.unwrap_err();
    assert!(matches!(err, TransportError::DialFailed(_)));
}

// =========================================================================
// WebSocket connector
// =========================================================================

#[cfg(feature = "websocket")]
mod websocket {
    use futures_util::{SinkExt, StreamExt};
    use roomswap_transport::{Connection, Connector, WebSocketConnector};
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message;

    /// Binds a one-shot WebSocket server on a random loopback port and
    /// returns its address plus a handle resolving to the accepted stream.
    async fn spawn_server() -> (
        String,
        tokio::task::JoinHandle<
            tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
        >,
    ) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            tokio_tungstenite::accept_async(stream)
                .await
                .expect("ws handshake")
        });
        (format!("ws://{addr}"), handle)
    }

    #[tokio::test]
    async fn test_websocket_dial_and_send_receive() {
        let (url, server_handle) = spawn_server().await;

        let conn = WebSocketConnector::new().dial(&url).await.expect("dial");
        let mut server_ws = server_handle.await.expect("server task");

        assert!(conn.id().into_inner() > 0);

        // --- Client sends, server receives ---
        conn.send(b"hello matcher").await.expect("send");
        let msg = server_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"hello matcher");

        // --- Server sends, client receives ---
        server_ws
            .send(Message::Binary(b"hello client".to_vec().into()))
            .await
            .unwrap();
        let received = conn.recv().await.expect("recv").expect("data");
        assert_eq!(received, b"hello client");

        conn.close().await.expect("close");
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_server_close() {
        let (url, server_handle) = spawn_server().await;

        let conn = WebSocketConnector::new().dial(&url).await.expect("dial");
        let mut server_ws = server_handle.await.expect("server task");

        server_ws.send(Message::Close(None)).await.unwrap();

        let result = conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on server close");
    }

    #[tokio::test]
    async fn test_websocket_dial_refused() {
        // Nothing is listening on this port.
        let result = WebSocketConnector::new()
            .dial("ws://127.0.0.1:9")
            .await;
        assert!(result.is_err());
    }
}
