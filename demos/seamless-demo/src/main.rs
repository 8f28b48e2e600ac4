//! Seamless room switching, end to end, in one process.
//!
//! Runs a matcher stub over the in-memory transport, connects to a lobby,
//! then quickmatches into a public room — seamlessly, so the status line
//! never drops back to "Not connected" between the two rooms.
//!
//! Run with `RUST_LOG=debug` to watch the state machine underneath.

use std::time::Duration;

use rand::Rng;
use roomswap::prelude::*;
use roomswap::SeamlessStatusDisplay;
use roomswap_frame::FrameClock;
use roomswap_protocol::{Codec, JsonCodec, MatcherRequest, MatcherResponse, RoomTarget};
use roomswap_transport::{Connection, MemoryConnection, MemoryListener, memory_pair};

#[tokio::main]
async fn main() -> Result<(), RoomswapError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let (connector, listener) = memory_pair();
    spawn_matcher(listener);

    let settings = AppSettings::new("demo-app-key", "mem://matcher");
    let endpoint = Endpoint::new(connector, settings);
    let mut connecter = SeamlessRoomConnecter::new(endpoint);
    let mut display = SeamlessStatusDisplay::new(&mut connecter, "Room: ");

    println!("connecting to the lobby...");
    connecter.connect_to_room("lobby")?;

    let mut clock = FrameClock::with_rate(60);
    let mut last_status = String::new();
    let mut quickmatched = false;
    let mut frames_connected = 0u32;

    loop {
        let frame = clock.wait_for_frame().await;
        connecter.tick(frame.dt);
        display.tick(&connecter, None);

        if display.name_text() != last_status {
            last_status = display.name_text().to_string();
            println!("{last_status}");
        }

        if connecter.endpoint().connected() {
            frames_connected += 1;

            // Hang out in the lobby for a second, then switch seamlessly.
            if !quickmatched && frames_connected > 60 {
                quickmatched = true;
                println!("quickmatching into a public room...");
                connecter.quickmatch()?;
            }

            // Once we've swapped into the quickmatch room, we're done.
            if quickmatched
                && connecter
                    .endpoint()
                    .room()
                    .is_some_and(Room::is_quickmatch_room)
                && frames_connected > 120
            {
                break;
            }
        }
    }

    println!(
        "done: landed in {}",
        connecter
            .endpoint()
            .room()
            .map(roomswap::room_display_name)
            .unwrap_or_default()
    );
    connecter.shutdown();
    Ok(())
}

// ---------------------------------------------------------------------------
// Matcher stub
// ---------------------------------------------------------------------------

/// Accepts every join, assigns random codes to matchmake requests, and
/// answers heartbeats.
fn spawn_matcher(mut listener: MemoryListener) {
    tokio::spawn(async move {
        while let Some(conn) = listener.accept().await {
            tokio::spawn(serve(conn));
        }
    });
}

async fn serve(conn: MemoryConnection) {
    let codec = JsonCodec;
    while let Ok(Some(bytes)) = conn.recv().await {
        let Ok(request) = codec.decode::<MatcherRequest>(&bytes) else {
            continue;
        };
        let response = match request {
            MatcherRequest::JoinRoom { room_name, .. } => MatcherResponse::Joined {
                target: RoomTarget::Room { name: room_name },
            },
            MatcherRequest::JoinQuickmatch { group, code, .. } => MatcherResponse::Joined {
                target: RoomTarget::Quickmatch { group, code },
            },
            MatcherRequest::Matchmake { group, .. } => MatcherResponse::Joined {
                target: RoomTarget::Quickmatch {
                    group,
                    code: random_room_code(),
                },
            },
            MatcherRequest::Heartbeat { client_time } => MatcherResponse::Pong { client_time },
            MatcherRequest::Leave => break,
        };
        let Ok(payload) = codec.encode(&response) else {
            continue;
        };
        if conn.send(&payload).await.is_err() {
            break;
        }
    }
}

fn random_room_code() -> String {
    let mut rng = rand::rng();
    (0..4).map(|_| rng.random_range(b'A'..=b'Z') as char).collect()
}
