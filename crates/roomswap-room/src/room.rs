//! The room connection object.
//!
//! A `Room` is single-use: construct it, issue exactly one connect
//! operation, then tick it until it reaches `Ready` or a terminal state.
//! The network side runs in a background session task; `tick` drains its
//! events, advances the state machine, and drives the connect timeout and
//! heartbeat clocks. A room that is never ticked makes no progress.

use std::sync::Arc;
use std::time::Duration;

use roomswap_protocol::{Codec, JsonCodec, MatcherRequest, MatcherResponse, RoomTarget};
use roomswap_transport::{Connection, Connector};
use tokio::sync::mpsc;

use crate::options::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_HEARTBEAT_TIMEOUT,
};
use crate::{ConnectOptions, ConnectionState, DisconnectEvent, RoomError, StateChange};

/// Events the session task reports back to the room.
#[derive(Debug)]
enum SessionEvent {
    /// The transport connection to the matcher is up.
    ServerReached,
    /// The matcher confirmed the join; `target` is the concrete room.
    Joined { target: RoomTarget },
    /// Keep-alive reply.
    Pong,
    /// The attempt failed outright (dial failure, matcher rejection).
    Failed { message: String },
    /// The connection ended (server close, eviction, transport error).
    Closed { message: Option<String> },
}

/// Commands the room sends to its session task.
#[derive(Debug)]
enum SessionCommand {
    Heartbeat { client_time: u64 },
    Leave,
}

struct SessionHandle {
    events: mpsc::UnboundedReceiver<SessionEvent>,
    commands: mpsc::UnboundedSender<SessionCommand>,
    task: tokio::task::JoinHandle<()>,
}

/// A single room connection.
///
/// Owned exclusively: only the owner ticks it, subscribes to it, and
/// disposes it. Ownership moves wholesale when a room is promoted to an
/// endpoint's active slot.
pub struct Room<C: Connector> {
    connector: Arc<C>,
    state: ConnectionState,
    target: Option<RoomTarget>,
    disconnect_event: Option<DisconnectEvent>,
    subscribers: Vec<mpsc::UnboundedSender<StateChange>>,
    session: Option<SessionHandle>,
    started: bool,
    disposed: bool,

    connect_timeout: Duration,
    heartbeat_interval: Duration,
    heartbeat_timeout: Duration,

    /// Total ticked time, used as the heartbeat timestamp base.
    session_time: Duration,
    /// Ticked time spent in the connecting states.
    connect_elapsed: Duration,
    /// Ticked time since the last heartbeat was sent.
    since_heartbeat: Duration,
    /// Ticked time spent waiting for a pong, when one is outstanding.
    pong_outstanding: Option<Duration>,
}

impl<C: Connector> Room<C> {
    /// Creates a new, disconnected room that will dial through `connector`.
    pub fn new(connector: Arc<C>) -> Self {
        Self {
            connector,
            state: ConnectionState::Disconnected,
            target: None,
            disconnect_event: None,
            subscribers: Vec::new(),
            session: None,
            started: false,
            disposed: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
            session_time: Duration::ZERO,
            connect_elapsed: Duration::ZERO,
            since_heartbeat: Duration::ZERO,
            pong_outstanding: None,
        }
    }

    // -- Connect operations --------------------------------------------

    /// Connects to a private room by name.
    pub fn connect(
        &mut self,
        room_name: &str,
        options: ConnectOptions,
    ) -> Result<(), RoomError> {
        let app_key = required(&options.app_key, "app_key")?;
        let request = MatcherRequest::JoinRoom {
            app_key,
            room_name: room_name.to_string(),
        };
        let target = RoomTarget::Room {
            name: room_name.to_string(),
        };
        self.start_session(target, request, options)
    }

    /// Connects to a specific quickmatch room by group and code.
    pub fn connect_directly_to_quickmatch_room(
        &mut self,
        group: &str,
        code: &str,
        options: ConnectOptions,
    ) -> Result<(), RoomError> {
        let app_key = required(&options.app_key, "app_key")?;
        let request = MatcherRequest::JoinQuickmatch {
            app_key,
            group: group.to_string(),
            code: code.to_string(),
        };
        let target = RoomTarget::Quickmatch {
            group: group.to_string(),
            code: code.to_string(),
        };
        self.start_session(target, request, options)
    }

    /// Asks the matcher to find or create the next available quickmatch
    /// room in `group`. The concrete room code is known once `Ready`.
    pub fn connect_to_next_available_quickmatch_room(
        &mut self,
        group: &str,
        capacity: u32,
        options: ConnectOptions,
    ) -> Result<(), RoomError> {
        let app_key = required(&options.app_key, "app_key")?;
        let request = MatcherRequest::Matchmake {
            app_key,
            group: group.to_string(),
            capacity,
        };
        let target = RoomTarget::QuickmatchGroup {
            group: group.to_string(),
        };
        self.start_session(target, request, options)
    }

    fn start_session(
        &mut self,
        target: RoomTarget,
        request: MatcherRequest,
        options: ConnectOptions,
    ) -> Result<(), RoomError> {
        if self.disposed {
            return Err(RoomError::Disposed);
        }
        if self.started {
            return Err(RoomError::AlreadyStarted);
        }
        let matcher_url = required(&options.matcher_url, "matcher_url")?;

        self.connect_timeout = options.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        self.heartbeat_interval = options
            .heartbeat_interval
            .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL);
        self.heartbeat_timeout = options
            .heartbeat_timeout
            .unwrap_or(DEFAULT_HEARTBEAT_TIMEOUT);

        tracing::info!(room = %target, url = %matcher_url, "connecting to room");

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_session(
            Arc::clone(&self.connector),
            matcher_url,
            request,
            event_tx,
            command_rx,
        ));

        self.target = Some(target);
        self.started = true;
        self.session = Some(SessionHandle {
            events: event_rx,
            commands: command_tx,
            task,
        });
        self.transition(ConnectionState::ConnectingToServer);
        Ok(())
    }

    // -- Ticking -------------------------------------------------------

    /// Advances the room by `dt` of elapsed time.
    ///
    /// Drains session events, publishes state changes to subscribers, and
    /// drives the connect timeout and heartbeat clocks. Must be called
    /// every cycle by whoever owns the room; an unticked room never times
    /// out and never observes its own state changes.
    pub fn tick(&mut self, dt: Duration) {
        if self.disposed {
            return;
        }
        self.session_time += dt;

        let mut events = Vec::new();
        if let Some(session) = self.session.as_mut() {
            while let Ok(event) = session.events.try_recv() {
                events.push(event);
            }
        }
        for event in events {
            self.apply(event);
        }

        match self.state {
            ConnectionState::ConnectingToServer | ConnectionState::JoiningRoom => {
                self.connect_elapsed += dt;
                if self.connect_elapsed >= self.connect_timeout {
                    tracing::warn!(room = ?self.target, "connection attempt timed out");
                    self.fail(
                        ConnectionState::Error,
                        Some("connection attempt timed out".to_string()),
                    );
                }
            }
            ConnectionState::Ready => self.tick_heartbeat(dt),
            ConnectionState::Disconnected | ConnectionState::Error => {}
        }
    }

    fn tick_heartbeat(&mut self, dt: Duration) {
        self.since_heartbeat += dt;

        if let Some(waiting) = self.pong_outstanding.as_mut() {
            *waiting += dt;
            if *waiting >= self.heartbeat_timeout {
                tracing::warn!(room = ?self.target, "heartbeat timed out");
                self.fail(
                    ConnectionState::Disconnected,
                    Some("heartbeat timed out".to_string()),
                );
                return;
            }
        }

        if self.since_heartbeat >= self.heartbeat_interval {
            self.since_heartbeat = Duration::ZERO;
            self.pong_outstanding.get_or_insert(Duration::ZERO);
            let client_time = self.session_time.as_millis() as u64;
            if let Some(session) = self.session.as_ref() {
                let _ = session
                    .commands
                    .send(SessionCommand::Heartbeat { client_time });
            }
        }
    }

    fn apply(&mut self, event: SessionEvent) {
        // Terminal states ignore stragglers from a stopped session.
        if self.state.is_disconnect() {
            return;
        }
        match event {
            SessionEvent::ServerReached => {
                if self.state == ConnectionState::ConnectingToServer {
                    self.transition(ConnectionState::JoiningRoom);
                }
            }
            SessionEvent::Joined { target } => {
                if self.state.is_connecting() {
                    self.target = Some(target);
                    self.transition(ConnectionState::Ready);
                }
            }
            SessionEvent::Pong => {
                self.pong_outstanding = None;
            }
            SessionEvent::Failed { message } => {
                self.fail(ConnectionState::Error, Some(message));
            }
            SessionEvent::Closed { message } => {
                self.fail(ConnectionState::Disconnected, message);
            }
        }
    }

    /// Records the disconnect details, stops the session, and enters the
    /// terminal state. The event is set before the transition is published
    /// so subscribers can read it from their state-change handler.
    fn fail(&mut self, terminal: ConnectionState, message: Option<String>) {
        self.disconnect_event = Some(DisconnectEvent::remote(self.target.clone(), message));
        self.stop_session();
        self.transition(terminal);
    }

    fn transition(&mut self, next: ConnectionState) {
        if self.state == next {
            return;
        }
        let previous = std::mem::replace(&mut self.state, next);
        tracing::debug!(room = ?self.target, %previous, current = %next, "room state changed");
        let change = StateChange {
            previous,
            current: next,
        };
        self.subscribers.retain(|tx| tx.send(change).is_ok());
    }

    // -- Subscription --------------------------------------------------

    /// Subscribes to this room's state changes.
    ///
    /// The initial transition is published synchronously from the connect
    /// call; everything after that surfaces from [`Room::tick`]. Dropping
    /// the receiver unsubscribes; the dead sender is pruned on the next
    /// publish.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<StateChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    // -- Teardown ------------------------------------------------------

    /// Releases all resources of the room. Idempotent.
    ///
    /// The session task is stopped and subscribers are dropped. A disposed
    /// room ignores further ticks.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.stop_session();
        self.subscribers.clear();
        tracing::debug!(room = ?self.target, "room disposed");
    }

    fn stop_session(&mut self) {
        if let Some(session) = self.session.take() {
            // Best-effort goodbye; the task may be gone before it sends.
            let _ = session.commands.send(SessionCommand::Leave);
            session.task.abort();
        }
    }

    // -- Accessors -----------------------------------------------------

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The room this connection is aimed at (or joined to), if a connect
    /// operation has been issued.
    pub fn target(&self) -> Option<&RoomTarget> {
        self.target.as_ref()
    }

    /// The room name, for private-room targets.
    pub fn name(&self) -> Option<&str> {
        self.target.as_ref().and_then(RoomTarget::room_name)
    }

    /// The quickmatch group, for quickmatch targets.
    pub fn quickmatch_room_group_name(&self) -> Option<&str> {
        self.target.as_ref().and_then(RoomTarget::quickmatch_group)
    }

    /// The quickmatch room code, once the matcher has resolved it.
    pub fn quickmatch_room_code(&self) -> Option<&str> {
        self.target.as_ref().and_then(RoomTarget::quickmatch_code)
    }

    /// Whether this room is a quickmatch room.
    pub fn is_quickmatch_room(&self) -> bool {
        self.target.as_ref().is_some_and(RoomTarget::is_quickmatch)
    }

    /// Terminal disconnect details, once the room has failed or closed.
    pub fn disconnect_event(&self) -> Option<&DisconnectEvent> {
        self.disconnect_event.as_ref()
    }

    /// Whether [`Room::dispose`] has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl<C: Connector> Drop for Room<C> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn required(field: &Option<String>, name: &'static str) -> Result<String, RoomError> {
    field.clone().ok_or(RoomError::MissingOption(name))
}

// ---------------------------------------------------------------------------
// Session task
// ---------------------------------------------------------------------------

/// Dials the matcher, issues the join request, then pumps responses and
/// commands until the connection ends or the room tells it to leave.
async fn run_session<C: Connector>(
    connector: Arc<C>,
    url: String,
    request: MatcherRequest,
    events: mpsc::UnboundedSender<SessionEvent>,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
) {
    let codec = JsonCodec;

    let conn = match connector.dial(&url).await {
        Ok(conn) => conn,
        Err(e) => {
            let _ = events.send(SessionEvent::Failed {
                message: format!("failed to reach matcher: {e}"),
            });
            return;
        }
    };
    let _ = events.send(SessionEvent::ServerReached);

    let payload = match codec.encode(&request) {
        Ok(payload) => payload,
        Err(e) => {
            let _ = events.send(SessionEvent::Failed {
                message: format!("failed to encode join request: {e}"),
            });
            return;
        }
    };
    if let Err(e) = conn.send(&payload).await {
        let _ = events.send(SessionEvent::Failed {
            message: format!("failed to send join request: {e}"),
        });
        return;
    }

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(SessionCommand::Heartbeat { client_time }) => {
                    let ping = MatcherRequest::Heartbeat { client_time };
                    let Ok(payload) = codec.encode(&ping) else { continue };
                    if conn.send(&payload).await.is_err() {
                        let _ = events.send(SessionEvent::Closed {
                            message: Some("connection lost while sending heartbeat".to_string()),
                        });
                        return;
                    }
                }
                // Room dropped the command channel or asked to leave.
                Some(SessionCommand::Leave) | None => {
                    if let Ok(payload) = codec.encode(&MatcherRequest::Leave) {
                        let _ = conn.send(&payload).await;
                    }
                    let _ = conn.close().await;
                    return;
                }
            },
            message = conn.recv() => match message {
                Ok(Some(bytes)) => match codec.decode::<MatcherResponse>(&bytes) {
                    Ok(MatcherResponse::Joined { target }) => {
                        let _ = events.send(SessionEvent::Joined { target });
                    }
                    Ok(MatcherResponse::Pong { .. }) => {
                        let _ = events.send(SessionEvent::Pong);
                    }
                    Ok(MatcherResponse::Rejected { code, message }) => {
                        let _ = events.send(SessionEvent::Failed {
                            message: format!("{message} ({code})"),
                        });
                        return;
                    }
                    Ok(MatcherResponse::Evicted { message }) => {
                        let _ = events.send(SessionEvent::Closed {
                            message: Some(message),
                        });
                        return;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "dropping malformed matcher message");
                    }
                },
                Ok(None) => {
                    let _ = events.send(SessionEvent::Closed { message: None });
                    return;
                }
                Err(e) => {
                    let _ = events.send(SessionEvent::Closed {
                        message: Some(e.to_string()),
                    });
                    return;
                }
            },
        }
    }
}
