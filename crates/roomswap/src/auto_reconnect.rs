//! Automatic reconnection after unexpected disconnects.

use std::time::Duration;

use rand::Rng;
use roomswap_protocol::RoomTarget;
use roomswap_room::ConnectOptions;
use roomswap_transport::Connector;
use tokio::sync::mpsc;

use crate::{Endpoint, EndpointEvent, RoomswapError};

/// Wait before the second attempt; doubles each attempt after that.
const BASE_WAIT: Duration = Duration::from_secs(2);
const MAX_WAIT: Duration = Duration::from_secs(30);

#[derive(Debug)]
struct ReconnectState {
    target: RoomTarget,
    /// The wait this attempt was scheduled with (0 = immediate retry).
    wait_time: Duration,
    remaining: Duration,
    attempt: u32,
}

/// Watches an [`Endpoint`] for non-local disconnects and retries the
/// last target with doubling, jittered backoff.
///
/// The first retry is immediate; subsequent ones wait 2s, 4s, 8s... up to
/// 30s, each with up to 50% random jitter so a room full of clients that
/// lost the same server doesn't reconnect in lockstep. A successful
/// connect or an explicit local disconnect clears the retry loop.
pub struct AutoReconnect {
    /// Capacity used when the lost room was a matchmake target.
    pub quickmatch_room_capacity: u32,

    events: mpsc::UnboundedReceiver<EndpointEvent>,
    state: Option<ReconnectState>,
}

impl AutoReconnect {
    /// Subscribes to `endpoint` and starts watching for disconnects.
    pub fn new<C: Connector>(endpoint: &mut Endpoint<C>) -> Self {
        Self {
            quickmatch_room_capacity: 16,
            events: endpoint.subscribe(),
            state: None,
        }
    }

    /// Whether a reconnect attempt is scheduled or in flight.
    pub fn is_reconnecting(&self) -> bool {
        self.state.is_some()
    }

    /// The wait the current attempt was scheduled with. Zero for the
    /// immediate first retry.
    pub fn wait_time(&self) -> Duration {
        self.state
            .as_ref()
            .map(|s| s.wait_time)
            .unwrap_or(Duration::ZERO)
    }

    /// Time left until the next attempt fires.
    pub fn remaining_time(&self) -> Duration {
        self.state
            .as_ref()
            .map(|s| s.remaining)
            .unwrap_or(Duration::ZERO)
    }

    /// Advances the reconnect clock and issues a retry when it elapses.
    ///
    /// Call once per cycle, after the endpoint's own tick.
    pub fn tick<C: Connector>(
        &mut self,
        endpoint: &mut Endpoint<C>,
        dt: Duration,
    ) -> Result<(), RoomswapError> {
        while let Ok(event) = self.events.try_recv() {
            match event {
                EndpointEvent::DidConnect { .. } => {
                    if self.state.take().is_some() {
                        tracing::info!("reconnected");
                    }
                }
                EndpointEvent::DidDisconnect(evt) => {
                    if evt.initiated_locally {
                        self.state = None;
                    } else if let Some(target) = evt.target {
                        self.schedule(target);
                    }
                }
            }
        }

        let due = match self.state.as_mut() {
            Some(state) => {
                state.remaining = state.remaining.saturating_sub(dt);
                state.remaining.is_zero()
            }
            None => false,
        };
        if due {
            self.attempt(endpoint)?;
        }
        Ok(())
    }

    fn schedule(&mut self, target: RoomTarget) {
        // Keep the attempt counter across repeated failures to the same
        // target so the backoff actually grows.
        let attempt = self.state.as_ref().map(|s| s.attempt).unwrap_or(0);
        let wait_time = backoff(attempt);
        tracing::info!(room = %target, wait_s = wait_time.as_secs_f64(), attempt, "scheduling reconnect");
        self.state = Some(ReconnectState {
            target,
            wait_time,
            remaining: wait_time,
            attempt,
        });
    }

    fn attempt<C: Connector>(
        &mut self,
        endpoint: &mut Endpoint<C>,
    ) -> Result<(), RoomswapError> {
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };
        state.attempt += 1;
        let target = state.target.clone();

        // Pre-arm the next attempt; a successful DidConnect clears it.
        let wait_time = backoff(state.attempt);
        state.wait_time = wait_time;
        state.remaining = wait_time;

        tracing::info!(room = %target, attempt = state.attempt, "attempting reconnect");
        match &target {
            RoomTarget::Room { name } => endpoint.connect(name, ConnectOptions::default()),
            RoomTarget::Quickmatch { group, code } => endpoint
                .connect_directly_to_quickmatch_room(group, code, ConnectOptions::default()),
            RoomTarget::QuickmatchGroup { group } => endpoint
                .connect_to_next_available_quickmatch_room(
                    group,
                    self.quickmatch_room_capacity,
                    ConnectOptions::default(),
                ),
        }
    }
}

/// Backoff for the given attempt number: 0, 2s, 4s, 8s... capped at 30s,
/// with up to 50% jitter added.
fn backoff(attempt: u32) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }
    let base = BASE_WAIT.saturating_mul(1 << (attempt - 1).min(5));
    let base = base.min(MAX_WAIT);
    let jitter = base.mul_f64(rand::rng().random_range(0.0..0.5));
    base + jitter
}
