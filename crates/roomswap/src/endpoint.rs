//! The endpoint: the single long-lived connection slot.
//!
//! An [`Endpoint`] is what the rest of the application sees as "the"
//! multiplayer connection. It owns at most one active [`Room`], ticks it,
//! and publishes connect/disconnect events. It never connects in the
//! background — that is the seamless connecter's job, which hands a
//! finished room over via [`Endpoint::set_room`].

use std::sync::Arc;
use std::time::Duration;

use roomswap_protocol::RoomTarget;
use roomswap_room::{
    AppSettings, ConnectOptions, ConnectionState, DisconnectEvent, Room, StateChange,
};
use roomswap_transport::Connector;
use tokio::sync::mpsc;

use crate::RoomswapError;

/// Events published by an [`Endpoint`] to its subscribers.
#[derive(Debug, Clone)]
pub enum EndpointEvent {
    /// The active room reached `Ready` (by its own connect, or by
    /// handover of an already-ready room).
    DidConnect { target: RoomTarget },

    /// The active room went away: a local `disconnect()` call, a network
    /// failure, or a matcher eviction. Check
    /// [`DisconnectEvent::initiated_locally`] to tell them apart.
    DidDisconnect(DisconnectEvent),
}

/// The single active connection slot of a client.
pub struct Endpoint<C: Connector> {
    connector: Arc<C>,
    settings: AppSettings,
    room: Option<Room<C>>,
    room_changes: Option<mpsc::UnboundedReceiver<StateChange>>,
    subscribers: Vec<mpsc::UnboundedSender<EndpointEvent>>,
}

impl<C: Connector> Endpoint<C> {
    /// Creates a disconnected endpoint.
    pub fn new(connector: C, settings: AppSettings) -> Self {
        Self {
            connector: Arc::new(connector),
            settings,
            room: None,
            room_changes: None,
            subscribers: Vec::new(),
        }
    }

    // -- Connection state ----------------------------------------------

    /// Whether the active room is established and ready.
    pub fn connected(&self) -> bool {
        self.room_state() == Some(ConnectionState::Ready)
    }

    /// Whether the active room is still connecting.
    pub fn connecting(&self) -> bool {
        self.room_state().is_some_and(|s| s.is_connecting())
    }

    /// Whether there is no active or in-flight connection.
    pub fn disconnected(&self) -> bool {
        !self.connected() && !self.connecting()
    }

    fn room_state(&self) -> Option<ConnectionState> {
        self.room.as_ref().map(Room::state)
    }

    /// The active room, if any.
    pub fn room(&self) -> Option<&Room<C>> {
        self.room.as_ref()
    }

    /// The ambient application settings connect requests default from.
    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// The connector shared by every room this endpoint's client creates.
    pub fn connector(&self) -> Arc<C> {
        Arc::clone(&self.connector)
    }

    // -- Direct connect operations -------------------------------------

    /// Connects the endpoint itself to a private room by name.
    ///
    /// This is the plain, non-seamless path: any existing room is
    /// disconnected first and the player watches the new connection
    /// happen.
    pub fn connect(
        &mut self,
        room_name: &str,
        mut options: ConnectOptions,
    ) -> Result<(), RoomswapError> {
        options.fill_from(&self.settings);
        let mut room = self.new_room();
        room.connect(room_name, options)?;
        self.install_room(room);
        Ok(())
    }

    /// Connects the endpoint itself to a specific quickmatch room.
    pub fn connect_directly_to_quickmatch_room(
        &mut self,
        group: &str,
        code: &str,
        mut options: ConnectOptions,
    ) -> Result<(), RoomswapError> {
        options.fill_from(&self.settings);
        let mut room = self.new_room();
        room.connect_directly_to_quickmatch_room(group, code, options)?;
        self.install_room(room);
        Ok(())
    }

    /// Matchmakes the endpoint itself into a quickmatch group.
    pub fn connect_to_next_available_quickmatch_room(
        &mut self,
        group: &str,
        capacity: u32,
        mut options: ConnectOptions,
    ) -> Result<(), RoomswapError> {
        options.fill_from(&self.settings);
        let mut room = self.new_room();
        room.connect_to_next_available_quickmatch_room(group, capacity, options)?;
        self.install_room(room);
        Ok(())
    }

    fn new_room(&mut self) -> Room<C> {
        if self.room.is_some() {
            self.disconnect();
        }
        Room::new(Arc::clone(&self.connector))
    }

    fn install_room(&mut self, mut room: Room<C>) {
        self.room_changes = Some(room.subscribe());
        self.room = Some(room);
    }

    // -- Handover ------------------------------------------------------

    /// Assigns `room` as the active room. The endpoint manages it from
    /// here on: ticking, heartbeats, and disconnect handling.
    ///
    /// This is the handover half of a seamless swap — the room is usually
    /// already `Ready`, in which case a `DidConnect` event fires
    /// immediately.
    pub fn set_room(&mut self, mut room: Room<C>) {
        if self.room.is_some() {
            self.disconnect();
        }
        let target = room.target().cloned();
        tracing::info!(room = ?target, "active room assigned");
        self.room_changes = Some(room.subscribe());
        let ready = room.state() == ConnectionState::Ready;
        self.room = Some(room);
        if ready {
            if let Some(target) = target {
                self.emit(EndpointEvent::DidConnect { target });
            }
        }
    }

    /// Disconnects the active room, if any. Publishes a locally-initiated
    /// [`DisconnectEvent`].
    pub fn disconnect(&mut self) {
        self.room_changes = None;
        if let Some(mut room) = self.room.take() {
            let target = room.target().cloned();
            room.dispose();
            tracing::info!(room = ?target, "disconnected by local request");
            self.emit(EndpointEvent::DidDisconnect(DisconnectEvent::local(target)));
        }
    }

    // -- Ticking -------------------------------------------------------

    /// Advances the endpoint by `dt`: ticks the active room and converts
    /// its state changes into endpoint events.
    pub fn tick(&mut self, dt: Duration) {
        if let Some(room) = self.room.as_mut() {
            room.tick(dt);
        }

        let mut changes = Vec::new();
        if let Some(rx) = self.room_changes.as_mut() {
            while let Ok(change) = rx.try_recv() {
                changes.push(change);
            }
        }
        for change in changes {
            match change.current {
                ConnectionState::Ready => {
                    if let Some(target) =
                        self.room.as_ref().and_then(|r| r.target().cloned())
                    {
                        self.emit(EndpointEvent::DidConnect { target });
                    }
                }
                ConnectionState::Disconnected | ConnectionState::Error => {
                    self.drop_room_with_event();
                }
                ConnectionState::ConnectingToServer | ConnectionState::JoiningRoom => {}
            }
        }
    }

    fn drop_room_with_event(&mut self) {
        self.room_changes = None;
        if let Some(mut room) = self.room.take() {
            let event = room
                .disconnect_event()
                .cloned()
                .unwrap_or_else(|| DisconnectEvent::remote(room.target().cloned(), None));
            room.dispose();
            self.emit(EndpointEvent::DidDisconnect(event));
        }
    }

    // -- Subscription --------------------------------------------------

    /// Subscribes to this endpoint's connect/disconnect events.
    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<EndpointEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: EndpointEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
