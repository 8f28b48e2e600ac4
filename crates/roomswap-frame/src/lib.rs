//! Frame pacing for Roomswap host loops.
//!
//! Rooms, endpoints, and connecters are advanced by an explicit
//! `tick(dt)` call once per cycle. [`FrameClock`] paces that loop at a
//! target frame rate and reports the measured elapsed time per frame:
//!
//! ```ignore
//! let mut clock = FrameClock::with_rate(60);
//! loop {
//!     let frame = clock.wait_for_frame().await;
//!     connecter.tick(frame.dt);
//! }
//! ```
//!
//! The reported `dt` is wall-clock elapsed time (not the nominal frame
//! duration), clamped to [`FrameConfig::max_dt`] so a long stall doesn't
//! flow into timeout bookkeeping as one giant step.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the frame clock.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Target frame rate in Hz.
    pub frame_rate_hz: u32,
    /// Upper bound on the `dt` reported for a single frame.
    pub max_dt: Duration,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: 60,
            max_dt: Duration::from_millis(250),
        }
    }
}

impl FrameConfig {
    /// Maximum supported frame rate.
    pub const MAX_FRAME_RATE_HZ: u32 = 240;

    /// Creates a config for a specific frame rate with default clamping.
    pub fn with_rate(frame_rate_hz: u32) -> Self {
        Self {
            frame_rate_hz,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`FrameClock::new`]. Rules:
    /// - `frame_rate_hz` clamped to `1..=MAX_FRAME_RATE_HZ`.
    /// - `max_dt` forced to at least one frame duration.
    pub fn validated(mut self) -> Self {
        if self.frame_rate_hz == 0 {
            warn!("frame_rate_hz of 0 is invalid, using 1");
            self.frame_rate_hz = 1;
        }
        if self.frame_rate_hz > Self::MAX_FRAME_RATE_HZ {
            warn!(
                rate = self.frame_rate_hz,
                max = Self::MAX_FRAME_RATE_HZ,
                "frame_rate_hz exceeds maximum, clamping"
            );
            self.frame_rate_hz = Self::MAX_FRAME_RATE_HZ;
        }
        let frame = self.frame_duration();
        if self.max_dt < frame {
            self.max_dt = frame;
        }
        self
    }

    /// Duration of a single frame at the target rate.
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate_hz as f64)
    }
}

// ---------------------------------------------------------------------------
// Frame info
// ---------------------------------------------------------------------------

/// Information about a frame, returned by [`FrameClock::wait_for_frame`].
#[derive(Debug, Clone, Copy)]
pub struct FrameInfo {
    /// Monotonically increasing frame number (starts at 1).
    pub frame: u64,
    /// Measured elapsed time since the previous frame, clamped to
    /// [`FrameConfig::max_dt`]. The first frame reports one nominal
    /// frame duration.
    pub dt: Duration,
    /// `true` if this frame fired noticeably late.
    pub overrun: bool,
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Paces a host loop at a target frame rate.
///
/// One `FrameClock` per loop. When a frame overruns its slot the clock
/// reschedules from now rather than trying to catch up, so a stall never
/// causes a burst of back-to-back frames.
pub struct FrameClock {
    config: FrameConfig,
    frame_duration: Duration,
    frame_count: u64,
    next_frame: Instant,
    last_frame: Option<Instant>,
}

impl FrameClock {
    /// Creates a new clock from config. The first frame fires one frame
    /// duration from now.
    pub fn new(config: FrameConfig) -> Self {
        let config = config.validated();
        let frame_duration = config.frame_duration();
        debug!(
            rate_hz = config.frame_rate_hz,
            frame_ms = frame_duration.as_secs_f64() * 1000.0,
            "frame clock created"
        );
        Self {
            config,
            frame_duration,
            frame_count: 0,
            next_frame: Instant::now() + frame_duration,
            last_frame: None,
        }
    }

    /// Creates a clock for a specific frame rate with default settings.
    pub fn with_rate(frame_rate_hz: u32) -> Self {
        Self::new(FrameConfig::with_rate(frame_rate_hz))
    }

    /// Waits until the next frame is due and returns its [`FrameInfo`].
    pub async fn wait_for_frame(&mut self) -> FrameInfo {
        time::sleep_until(self.next_frame).await;

        let now = Instant::now();
        self.frame_count += 1;

        let late_by = now.saturating_duration_since(self.next_frame);
        let overrun = late_by > self.frame_duration / 10;
        if overrun {
            warn!(
                frame = self.frame_count,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "frame overrun, rescheduling from now"
            );
        }
        // Always schedule from now, never from the missed deadline.
        self.next_frame = now + self.frame_duration;

        let dt = match self.last_frame {
            Some(previous) => now.duration_since(previous).min(self.config.max_dt),
            None => self.frame_duration,
        };
        self.last_frame = Some(now);

        trace!(frame = self.frame_count, dt_ms = dt.as_secs_f64() * 1000.0, "frame");

        FrameInfo {
            frame: self.frame_count,
            dt,
            overrun,
        }
    }

    /// Frames elapsed so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The configured frame rate in Hz.
    pub fn frame_rate_hz(&self) -> u32 {
        self.config.frame_rate_hz
    }

    /// The nominal duration of one frame.
    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }
}
