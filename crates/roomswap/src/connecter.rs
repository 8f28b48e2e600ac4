//! Seamless room switching.
//!
//! [`SeamlessRoomConnecter`] connects to a new room in the background
//! while the endpoint stays on its current room, then atomically swaps
//! the new room into the endpoint's active slot once it is ready. The
//! player never watches a "Connecting..." screen between rooms; a failed
//! attempt leaves the current room untouched.

use std::time::Duration;

use roomswap_room::{
    ConnectOptions, ConnectionState, DisconnectEvent, Room, StateChange,
};
use roomswap_transport::Connector;
use tokio::sync::mpsc;

use crate::{Endpoint, RoomswapError};

/// Events published by a [`SeamlessRoomConnecter`] to its subscribers.
#[derive(Debug, Clone)]
pub enum ConnecterEvent {
    /// A connect request was accepted; fired before the network call is
    /// issued.
    WillConnect,

    /// An in-progress connection failed or disconnected before becoming
    /// the active room. The endpoint's current room is unaffected.
    DisconnectEvent(DisconnectEvent),
}

/// Token for a handover scheduled for the next tick. Dropping it (by
/// clearing the slot that holds it) cancels the handover.
struct PendingSwap;

/// Connects to rooms in the background and swaps them into an
/// [`Endpoint`] without a visible disconnect.
///
/// The connecter owns the endpoint and at most one in-progress room at a
/// time. Drive it with [`tick`](Self::tick) every cycle of the host loop;
/// the in-progress room is not attached to the endpoint yet, so the
/// connecter must forward ticks to it or its timeout and heartbeat logic
/// would stall.
pub struct SeamlessRoomConnecter<C: Connector> {
    endpoint: Endpoint<C>,

    /// The quickmatch room group used by the convenience operations.
    pub quickmatch_group_name: String,

    /// Max player count when matchmaking creates a new quickmatch room.
    pub quickmatch_room_capacity: u32,

    room_in_progress: Option<Room<C>>,
    progress_changes: Option<mpsc::UnboundedReceiver<StateChange>>,
    pending_swap: Option<PendingSwap>,
    subscribers: Vec<mpsc::UnboundedSender<ConnecterEvent>>,
}

impl<C: Connector> SeamlessRoomConnecter<C> {
    /// Wraps an endpoint for seamless switching.
    pub fn new(endpoint: Endpoint<C>) -> Self {
        Self {
            endpoint,
            quickmatch_group_name: "default".to_string(),
            quickmatch_room_capacity: 16,
            room_in_progress: None,
            progress_changes: None,
            pending_swap: None,
            subscribers: Vec::new(),
        }
    }

    // -- Connect requests ----------------------------------------------

    /// Connects to a room by name with default options.
    pub fn connect_to_room(&mut self, room_name: &str) -> Result<(), RoomswapError> {
        self.connect(room_name, ConnectOptions::default())
    }

    /// Connects to a room by name.
    ///
    /// Seamless: the endpoint stays on its current room until the new
    /// connection is ready. A request targeting the room the endpoint is
    /// already on (or the one already in progress) is ignored.
    pub fn connect(
        &mut self,
        room_name: &str,
        options: ConnectOptions,
    ) -> Result<(), RoomswapError> {
        if !self.endpoint.disconnected()
            && self.endpoint.room().and_then(Room::name) == Some(room_name)
        {
            tracing::info!(
                room_name,
                "already connecting or connected, ignoring the connect call"
            );
            return Ok(());
        }
        if let Some(room) = &self.room_in_progress {
            if room.name() == Some(room_name) {
                tracing::info!(room_name, "already connecting, ignoring the connect call");
                return Ok(());
            }
        }

        let mut options = options;
        let mut room = self.prepare_connection(&mut options);
        room.connect(room_name, options)?;
        self.room_in_progress = Some(room);
        Ok(())
    }

    /// Connects to a specific quickmatch room in the configured group,
    /// with default options.
    pub fn connect_directly_to_quickmatch_room(
        &mut self,
        room_code: &str,
    ) -> Result<(), RoomswapError> {
        let group = self.quickmatch_group_name.clone();
        self.connect_directly_to_quickmatch_room_in(&group, room_code, ConnectOptions::default())
    }

    /// Connects to a specific quickmatch room by group and code.
    pub fn connect_directly_to_quickmatch_room_in(
        &mut self,
        group: &str,
        room_code: &str,
        options: ConnectOptions,
    ) -> Result<(), RoomswapError> {
        if !self.endpoint.disconnected() && self.endpoint_room_is_quickmatch(group, room_code) {
            tracing::info!(
                group,
                room_code,
                "already connecting or connected, ignoring the quickmatch call"
            );
            return Ok(());
        }
        if let Some(room) = &self.room_in_progress {
            if room.quickmatch_room_group_name() == Some(group)
                && room.quickmatch_room_code() == Some(room_code)
            {
                tracing::info!(
                    group,
                    room_code,
                    "already connecting, ignoring the quickmatch call"
                );
                return Ok(());
            }
        }

        let mut options = options;
        let mut room = self.prepare_connection(&mut options);
        room.connect_directly_to_quickmatch_room(group, room_code, options)?;
        self.room_in_progress = Some(room);
        Ok(())
    }

    /// Matchmakes into the configured quickmatch group with default
    /// options.
    pub fn quickmatch(&mut self) -> Result<(), RoomswapError> {
        let group = self.quickmatch_group_name.clone();
        let capacity = self.quickmatch_room_capacity;
        self.connect_to_next_available_quickmatch_room(&group, capacity, ConnectOptions::default())
    }

    /// Asks the matcher to find or create the next available room in a
    /// quickmatch group.
    ///
    /// The duplicate check here only applies while a connection to the
    /// same group is still in flight; matchmaking again from a connected
    /// quickmatch room is a real request (it may land in a different
    /// room of the group).
    pub fn connect_to_next_available_quickmatch_room(
        &mut self,
        group: &str,
        capacity: u32,
        options: ConnectOptions,
    ) -> Result<(), RoomswapError> {
        if self.endpoint.connecting()
            && self
                .endpoint
                .room()
                .and_then(Room::quickmatch_room_group_name)
                == Some(group)
        {
            tracing::info!(group, "already connecting to group, ignoring the matchmake call");
            return Ok(());
        }
        if let Some(room) = &self.room_in_progress {
            if room.quickmatch_room_group_name() == Some(group) {
                tracing::info!(group, "already connecting to group, ignoring the matchmake call");
                return Ok(());
            }
        }

        let mut options = options;
        let mut room = self.prepare_connection(&mut options);
        room.connect_to_next_available_quickmatch_room(group, capacity, options)?;
        self.room_in_progress = Some(room);
        Ok(())
    }

    fn endpoint_room_is_quickmatch(&self, group: &str, code: &str) -> bool {
        self.endpoint.room().is_some_and(|room| {
            room.quickmatch_room_group_name() == Some(group)
                && room.quickmatch_room_code() == Some(code)
        })
    }

    /// Accepts a connect request: discards any older in-progress room,
    /// resolves the options from the endpoint's ambient settings, and
    /// returns a fresh subscribed room for the caller to issue the
    /// connect call on.
    fn prepare_connection(&mut self, options: &mut ConnectOptions) -> Room<C> {
        // A new request always supersedes an unfinished one.
        self.destroy_room_if_needed();

        options.fill_from(self.endpoint.settings());

        let mut room = Room::new(self.endpoint.connector());
        self.progress_changes = Some(room.subscribe());

        self.emit(ConnecterEvent::WillConnect);
        room
    }

    // -- Ticking -------------------------------------------------------

    /// Advances the connecter by `dt`.
    ///
    /// Runs a due handover, ticks the endpoint, forwards the tick to the
    /// in-progress room (it isn't attached to the endpoint yet, so nobody
    /// else will), and handles its state changes.
    pub fn tick(&mut self, dt: Duration) {
        self.run_pending_swap();

        self.endpoint.tick(dt);

        if let Some(room) = self.room_in_progress.as_mut() {
            room.tick(dt);
        }

        let mut changes = Vec::new();
        if let Some(rx) = self.progress_changes.as_mut() {
            while let Ok(change) = rx.try_recv() {
                changes.push(change);
            }
        }
        for change in changes {
            self.on_connection_state_changed(change);
        }
    }

    fn on_connection_state_changed(&mut self, change: StateChange) {
        match change.current {
            ConnectionState::Ready => {
                // Tear the old room down now; the swap itself waits one
                // tick so cleanup driven by the disconnect finishes before
                // anything starts depending on the new room.
                if self.endpoint.connected() {
                    self.endpoint.disconnect();
                }
                self.pending_swap = Some(PendingSwap);
            }
            ConnectionState::Disconnected | ConnectionState::Error => {
                let event = self
                    .room_in_progress
                    .as_ref()
                    .and_then(|room| room.disconnect_event().cloned())
                    .unwrap_or_else(|| {
                        DisconnectEvent::remote(
                            self.room_in_progress
                                .as_ref()
                                .and_then(|room| room.target().cloned()),
                            None,
                        )
                    });
                tracing::warn!(reason = %event.message, "in-progress connection failed");
                self.emit(ConnecterEvent::DisconnectEvent(event));

                // The attempt failed; stay on the current room.
                self.destroy_room_if_needed();
            }
            ConnectionState::ConnectingToServer | ConnectionState::JoiningRoom => {}
        }
    }

    /// Performs a handover scheduled on the previous tick: unsubscribe,
    /// clear the in-progress slot without disposing, and assign the room
    /// to the endpoint in one step.
    fn run_pending_swap(&mut self) {
        if self.pending_swap.take().is_none() {
            return;
        }
        self.progress_changes = None;
        if let Some(room) = self.room_in_progress.take() {
            self.endpoint.set_room(room);
        }
    }

    // -- Teardown ------------------------------------------------------

    /// Cancels any pending handover and disposes any in-progress room.
    /// Idempotent. Call when the connecter's host is torn down.
    pub fn shutdown(&mut self) {
        self.destroy_room_if_needed();
    }

    fn destroy_room_if_needed(&mut self) {
        self.pending_swap = None;
        self.progress_changes = None;
        if let Some(mut room) = self.room_in_progress.take() {
            room.dispose();
        }
    }

    // -- Queries -------------------------------------------------------

    /// The room being connected in the background, if any.
    pub fn room_in_progress(&self) -> Option<&Room<C>> {
        self.room_in_progress.as_ref()
    }

    /// Whether a finished room is waiting out its one-tick handover
    /// delay.
    pub fn handover_pending(&self) -> bool {
        self.pending_swap.is_some()
    }

    /// The endpoint this connecter manages.
    pub fn endpoint(&self) -> &Endpoint<C> {
        &self.endpoint
    }

    /// Mutable access to the managed endpoint.
    pub fn endpoint_mut(&mut self) -> &mut Endpoint<C> {
        &mut self.endpoint
    }

    // -- Subscription --------------------------------------------------

    /// Subscribes to this connecter's events. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ConnecterEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: ConnecterEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
