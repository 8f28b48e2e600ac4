//! Integration tests for the endpoint, the plain connector, automatic
//! reconnection, and the status displays.

use std::sync::Arc;
use std::time::Duration;

use roomswap::prelude::*;
use roomswap::{EndpointStatusDisplay, SeamlessStatusDisplay};
use roomswap_protocol::{Codec, JsonCodec, MatcherRequest, MatcherResponse, RoomTarget};
use roomswap_transport::{
    Connection, MemoryConnection, MemoryConnector, MemoryListener, memory_pair,
};
use tokio::sync::mpsc;

const DT: Duration = Duration::from_millis(16);

async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

fn new_endpoint(connector: MemoryConnector) -> Endpoint<MemoryConnector> {
    Endpoint::new(connector, AppSettings::new("test-key", "mem://matcher"))
}

// A matcher stub that parks each join until the test resolves it.

struct PendingJoin {
    request: MatcherRequest,
    conn: Arc<MemoryConnection>,
}

impl PendingJoin {
    async fn joined(&self) {
        let target = match &self.request {
            MatcherRequest::JoinRoom { room_name, .. } => RoomTarget::Room {
                name: room_name.clone(),
            },
            MatcherRequest::JoinQuickmatch { group, code, .. } => RoomTarget::Quickmatch {
                group: group.clone(),
                code: code.clone(),
            },
            MatcherRequest::Matchmake { group, .. } => RoomTarget::Quickmatch {
                group: group.clone(),
                code: "QQRZ".into(),
            },
            other => panic!("unexpected request held as join: {other:?}"),
        };
        let payload = JsonCodec
            .encode(&MatcherResponse::Joined { target })
            .unwrap();
        let _ = self.conn.send(&payload).await;
    }

    async fn close(&self) {
        let _ = self.conn.close().await;
    }
}

fn spawn_manual_matcher(mut listener: MemoryListener) -> mpsc::UnboundedReceiver<PendingJoin> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(conn) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let codec = JsonCodec;
                let Ok(Some(bytes)) = conn.recv().await else {
                    return;
                };
                let Ok(request) = codec.decode::<MatcherRequest>(&bytes) else {
                    return;
                };
                let conn = Arc::new(conn);
                let _ = tx.send(PendingJoin {
                    request,
                    conn: Arc::clone(&conn),
                });
                while let Ok(Some(_)) = conn.recv().await {}
            });
        }
    });
    rx
}

async fn next_join(joins: &mut mpsc::UnboundedReceiver<PendingJoin>) -> PendingJoin {
    tokio::time::timeout(Duration::from_secs(5), joins.recv())
        .await
        .expect("matcher never saw the join request")
        .expect("matcher stub gone")
}

async fn tick_until_connected(endpoint: &mut Endpoint<MemoryConnector>) {
    for _ in 0..500 {
        endpoint.tick(DT);
        if endpoint.connected() {
            return;
        }
        settle().await;
    }
    panic!("endpoint never connected, state: connecting={}", endpoint.connecting());
}

// =========================================================================
// Endpoint
// =========================================================================

#[tokio::test]
async fn test_direct_connect_and_events() {
    let (connector, listener) = memory_pair();
    let mut joins = spawn_manual_matcher(listener);
    let mut endpoint = new_endpoint(connector);
    let mut events = endpoint.subscribe();

    assert!(endpoint.disconnected());

    endpoint.connect("alpha", ConnectOptions::default()).unwrap();
    assert!(endpoint.connecting());

    next_join(&mut joins).await.joined().await;
    tick_until_connected(&mut endpoint).await;

    assert_eq!(endpoint.room().and_then(Room::name), Some("alpha"));
    match events.try_recv().unwrap() {
        EndpointEvent::DidConnect { target } => {
            assert_eq!(target, RoomTarget::Room { name: "alpha".into() });
        }
        other => panic!("expected DidConnect, got {other:?}"),
    }
}

#[tokio::test]
async fn test_disconnect_emits_locally_initiated_event() {
    let (connector, listener) = memory_pair();
    let mut joins = spawn_manual_matcher(listener);
    let mut endpoint = new_endpoint(connector);

    endpoint.connect("alpha", ConnectOptions::default()).unwrap();
    next_join(&mut joins).await.joined().await;
    tick_until_connected(&mut endpoint).await;

    let mut events = endpoint.subscribe();
    endpoint.disconnect();

    assert!(endpoint.disconnected());
    assert!(endpoint.room().is_none());
    match events.try_recv().unwrap() {
        EndpointEvent::DidDisconnect(evt) => {
            assert!(evt.initiated_locally);
            assert_eq!(evt.target, Some(RoomTarget::Room { name: "alpha".into() }));
        }
        other => panic!("expected DidDisconnect, got {other:?}"),
    }

    // Disconnecting again is a no-op.
    endpoint.disconnect();
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_server_loss_surfaces_remote_disconnect() {
    let (connector, listener) = memory_pair();
    let mut joins = spawn_manual_matcher(listener);
    let mut endpoint = new_endpoint(connector);

    endpoint.connect("alpha", ConnectOptions::default()).unwrap();
    let join = next_join(&mut joins).await;
    join.joined().await;
    tick_until_connected(&mut endpoint).await;

    let mut events = endpoint.subscribe();
    join.close().await;

    for _ in 0..100 {
        endpoint.tick(DT);
        if endpoint.disconnected() {
            break;
        }
        settle().await;
    }
    assert!(endpoint.disconnected());
    match events.try_recv().unwrap() {
        EndpointEvent::DidDisconnect(evt) => assert!(!evt.initiated_locally),
        other => panic!("expected DidDisconnect, got {other:?}"),
    }
}

// =========================================================================
// RoomConnector
// =========================================================================

#[tokio::test]
async fn test_room_connector_switches_with_visible_disconnect() {
    let (connector, listener) = memory_pair();
    let mut joins = spawn_manual_matcher(listener);
    let mut endpoint = new_endpoint(connector);
    let room_connector = RoomConnector::default();

    room_connector.connect_to_room(&mut endpoint, "alpha").unwrap();
    next_join(&mut joins).await.joined().await;
    tick_until_connected(&mut endpoint).await;

    let mut events = endpoint.subscribe();
    room_connector.connect_to_room(&mut endpoint, "beta").unwrap();

    // Unlike the seamless connecter, the old room is gone immediately.
    assert!(endpoint.connecting());
    match events.try_recv().unwrap() {
        EndpointEvent::DidDisconnect(evt) => assert!(evt.initiated_locally),
        other => panic!("expected DidDisconnect, got {other:?}"),
    }

    next_join(&mut joins).await.joined().await;
    tick_until_connected(&mut endpoint).await;
    assert_eq!(endpoint.room().and_then(Room::name), Some("beta"));

    // Duplicate request: ignored.
    room_connector.connect_to_room(&mut endpoint, "beta").unwrap();
    assert!(endpoint.connected());
    assert!(events.try_recv().is_ok(), "the beta DidConnect");
    assert!(events.try_recv().is_err(), "no further events");
}

// =========================================================================
// AutoReconnect
// =========================================================================

#[tokio::test]
async fn test_auto_reconnect_retries_lost_room() {
    let (connector, listener) = memory_pair();
    let mut joins = spawn_manual_matcher(listener);
    let mut endpoint = new_endpoint(connector);
    let mut reconnect = AutoReconnect::new(&mut endpoint);

    endpoint.connect("alpha", ConnectOptions::default()).unwrap();
    let join = next_join(&mut joins).await;
    join.joined().await;
    tick_until_connected(&mut endpoint).await;
    reconnect.tick(&mut endpoint, DT).unwrap();
    assert!(!reconnect.is_reconnecting());

    // The server goes away.
    join.close().await;
    for _ in 0..100 {
        endpoint.tick(DT);
        reconnect.tick(&mut endpoint, DT).unwrap();
        if reconnect.is_reconnecting() || endpoint.connecting() {
            break;
        }
        settle().await;
    }

    // The retry kicks in and lands us back in the room.
    let rejoin = next_join(&mut joins).await;
    assert!(matches!(
        &rejoin.request,
        MatcherRequest::JoinRoom { room_name, .. } if room_name == "alpha"
    ));
    rejoin.joined().await;
    for _ in 0..200 {
        endpoint.tick(DT);
        reconnect.tick(&mut endpoint, DT).unwrap();
        if endpoint.connected() && !reconnect.is_reconnecting() {
            break;
        }
        settle().await;
    }
    assert!(endpoint.connected());
    assert!(!reconnect.is_reconnecting());
    assert_eq!(endpoint.room().and_then(Room::name), Some("alpha"));
}

#[tokio::test]
async fn test_local_disconnect_does_not_trigger_reconnect() {
    let (connector, listener) = memory_pair();
    let mut joins = spawn_manual_matcher(listener);
    let mut endpoint = new_endpoint(connector);
    let mut reconnect = AutoReconnect::new(&mut endpoint);

    endpoint.connect("alpha", ConnectOptions::default()).unwrap();
    next_join(&mut joins).await.joined().await;
    tick_until_connected(&mut endpoint).await;

    endpoint.disconnect();
    for _ in 0..20 {
        endpoint.tick(DT);
        reconnect.tick(&mut endpoint, DT).unwrap();
        settle().await;
    }
    assert!(!reconnect.is_reconnecting());
    assert!(endpoint.disconnected());
}

// =========================================================================
// Displays
// =========================================================================

#[tokio::test]
async fn test_endpoint_status_display_follows_connection() {
    let (connector, listener) = memory_pair();
    let mut joins = spawn_manual_matcher(listener);
    let mut endpoint = new_endpoint(connector);
    let mut display = EndpointStatusDisplay::new(&mut endpoint, "Current Room: ");

    display.tick(&endpoint, None);
    assert_eq!(display.name_text(), "Current Room: Not connected");

    endpoint.connect("alpha", ConnectOptions::default()).unwrap();
    display.tick(&endpoint, None);
    assert_eq!(display.name_text(), "Current Room: Connecting...");

    let join = next_join(&mut joins).await;
    join.joined().await;
    tick_until_connected(&mut endpoint).await;
    display.tick(&endpoint, None);
    assert_eq!(display.name_text(), "Current Room: alpha (Private)");
    assert_eq!(display.disconnect_text(), "");

    // A remote loss shows up in the details line; a new connect clears it.
    join.close().await;
    for _ in 0..100 {
        endpoint.tick(DT);
        if endpoint.disconnected() {
            break;
        }
        settle().await;
    }
    display.tick(&endpoint, None);
    assert_eq!(display.name_text(), "Current Room: Not connected");
    assert_eq!(
        display.disconnect_text(),
        "alpha (Private): Unspecified disconnect reason"
    );
}

#[tokio::test]
async fn test_seamless_status_display_shows_background_connect() {
    let (connector, listener) = memory_pair();
    let mut joins = spawn_manual_matcher(listener);
    let endpoint = new_endpoint(connector);
    let mut connecter = SeamlessRoomConnecter::new(endpoint);
    let mut display = SeamlessStatusDisplay::new(&mut connecter, "");

    connecter.connect_to_room("alpha").unwrap();
    next_join(&mut joins).await.joined().await;
    for _ in 0..500 {
        connecter.tick(DT);
        if connecter.endpoint().connected() {
            break;
        }
        settle().await;
    }
    display.tick(&connecter, None);
    assert_eq!(display.name_text(), "alpha (Private)");

    // Switching: the display shows the background connection, while the
    // endpoint itself still reports the old room.
    connecter.connect_to_room("beta").unwrap();
    let _join = next_join(&mut joins).await;
    connecter.tick(DT);
    display.tick(&connecter, None);
    assert_eq!(display.name_text(), "Connecting...");
    assert!(connecter.endpoint().connected());
}
