//! Plain-text status lines for room connections.
//!
//! Formatting only — no widget toolkit. A display drains the event
//! streams it subscribed to and recomputes two strings per tick: the
//! status line ("Not connected", "Connecting...", the current room's
//! display name) and a sticky disconnect-details line that persists until
//! the next connect attempt.

use roomswap_room::{DisconnectEvent, Room};
use roomswap_transport::Connector;
use tokio::sync::mpsc;

use crate::{
    AutoReconnect, ConnecterEvent, Endpoint, EndpointEvent, SeamlessRoomConnecter,
};

/// Player-facing display name of a room: quickmatch rooms show their
/// code, private rooms their name.
pub fn room_display_name<C: Connector>(room: &Room<C>) -> String {
    if room.is_quickmatch_room() {
        let code = room
            .quickmatch_room_code()
            .or(room.quickmatch_room_group_name())
            .unwrap_or("?");
        format!("{code} (Public)")
    } else {
        format!("{} (Private)", room.name().unwrap_or("?"))
    }
}

/// Player-facing display name of the room a disconnect event refers to.
pub fn disconnect_display_name(event: &DisconnectEvent) -> String {
    match &event.target {
        Some(target) if target.is_quickmatch() => {
            let code = target
                .quickmatch_code()
                .or(target.quickmatch_group())
                .unwrap_or("?");
            format!("{code} (Public)")
        }
        Some(target) => format!("{} (Private)", target.room_name().unwrap_or("?")),
        None => "Unknown room".to_string(),
    }
}

fn reconnect_status(reconnect: &AutoReconnect) -> String {
    if reconnect.wait_time().is_zero() {
        "Reconnecting...".to_string()
    } else {
        let seconds = reconnect.remaining_time().as_secs_f64().ceil() as u64;
        format!("Reconnecting... ({seconds})")
    }
}

fn endpoint_status<C: Connector>(endpoint: &Endpoint<C>) -> String {
    if endpoint.connected() {
        endpoint
            .room()
            .map(|room| room_display_name(room))
            .unwrap_or_default()
    } else if endpoint.connecting() {
        "Connecting...".to_string()
    } else {
        "Not connected".to_string()
    }
}

fn disconnect_line(event: &DisconnectEvent) -> String {
    format!("{}: {}", disconnect_display_name(event), event.message)
}

// ---------------------------------------------------------------------------
// EndpointStatusDisplay
// ---------------------------------------------------------------------------

/// Status lines for a plain [`Endpoint`].
pub struct EndpointStatusDisplay {
    prefix: String,
    name_text: String,
    disconnect_text: String,
    events: mpsc::UnboundedReceiver<EndpointEvent>,
}

impl EndpointStatusDisplay {
    /// Subscribes to `endpoint`. `prefix` is prepended to the status
    /// line, e.g. `"Current Room: "`.
    pub fn new<C: Connector>(endpoint: &mut Endpoint<C>, prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            name_text: String::new(),
            disconnect_text: String::new(),
            events: endpoint.subscribe(),
        }
    }

    /// Recomputes both lines. Call once per cycle, after the endpoint's
    /// tick.
    pub fn tick<C: Connector>(
        &mut self,
        endpoint: &Endpoint<C>,
        reconnect: Option<&AutoReconnect>,
    ) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                EndpointEvent::DidConnect { .. } => self.disconnect_text.clear(),
                EndpointEvent::DidDisconnect(evt) => self.record_disconnect(&evt),
            }
        }

        let description = match reconnect {
            Some(reconnect) if reconnect.is_reconnecting() => reconnect_status(reconnect),
            _ => endpoint_status(endpoint),
        };
        self.name_text = format!("{}{}", self.prefix, description);
    }

    fn record_disconnect(&mut self, event: &DisconnectEvent) {
        // Local disconnects are the player's own doing; don't report them.
        if event.initiated_locally {
            return;
        }
        self.disconnect_text = disconnect_line(event);
    }

    /// The status line.
    pub fn name_text(&self) -> &str {
        &self.name_text
    }

    /// The sticky disconnect-details line (empty when nothing to report).
    pub fn disconnect_text(&self) -> &str {
        &self.disconnect_text
    }
}

// ---------------------------------------------------------------------------
// SeamlessStatusDisplay
// ---------------------------------------------------------------------------

/// Status lines for a [`SeamlessRoomConnecter`].
///
/// Reports "Connecting..." while a background connection is in progress
/// and forwards disconnect details from both the connecter (failed
/// attempts) and its endpoint (lost established rooms).
pub struct SeamlessStatusDisplay {
    prefix: String,
    name_text: String,
    disconnect_text: String,
    connecter_events: mpsc::UnboundedReceiver<ConnecterEvent>,
    endpoint_events: mpsc::UnboundedReceiver<EndpointEvent>,
}

impl SeamlessStatusDisplay {
    /// Subscribes to `connecter` and its endpoint.
    pub fn new<C: Connector>(
        connecter: &mut SeamlessRoomConnecter<C>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            name_text: String::new(),
            disconnect_text: String::new(),
            connecter_events: connecter.subscribe(),
            endpoint_events: connecter.endpoint_mut().subscribe(),
        }
    }

    /// Recomputes both lines. Call once per cycle, after the connecter's
    /// tick.
    pub fn tick<C: Connector>(
        &mut self,
        connecter: &SeamlessRoomConnecter<C>,
        reconnect: Option<&AutoReconnect>,
    ) {
        while let Ok(event) = self.connecter_events.try_recv() {
            match event {
                ConnecterEvent::WillConnect => self.disconnect_text.clear(),
                ConnecterEvent::DisconnectEvent(evt) => self.record_disconnect(&evt),
            }
        }
        while let Ok(event) = self.endpoint_events.try_recv() {
            if let EndpointEvent::DidDisconnect(evt) = event {
                self.record_disconnect(&evt);
            }
        }

        let description = match reconnect {
            Some(reconnect) if reconnect.is_reconnecting() => reconnect_status(reconnect),
            _ if connecter.room_in_progress().is_some() => "Connecting...".to_string(),
            _ => endpoint_status(connecter.endpoint()),
        };
        self.name_text = format!("{}{}", self.prefix, description);
    }

    fn record_disconnect(&mut self, event: &DisconnectEvent) {
        if event.initiated_locally {
            return;
        }
        self.disconnect_text = disconnect_line(event);
    }

    /// The status line.
    pub fn name_text(&self) -> &str {
        &self.name_text
    }

    /// The sticky disconnect-details line (empty when nothing to report).
    pub fn disconnect_text(&self) -> &str {
        &self.disconnect_text
    }
}
