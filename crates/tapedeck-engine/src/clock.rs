//! Virtual clock and the ticker thread that drives it.
//!
//! The clock converts wall-clock time into recording time: each tick
//! adds the elapsed wall interval, scaled by the playback rate, to the
//! processed offset. The ticker runs the clock at a fixed period and
//! rings the dispatcher's doorbell after every tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::state::PlaybackState;

// ── VirtualClock ───────────────────────────────────────────────────

/// Wall-clock to recording-time converter.
///
/// Holds only the wall instant of the previous tick; the offset itself
/// lives in [`PlaybackState`] so that seeks and loops can overwrite it.
#[derive(Debug)]
pub struct VirtualClock {
    last_wall: Instant,
}

impl VirtualClock {
    /// A clock whose first interval starts at `now`.
    pub fn new(now: Instant) -> Self {
        Self { last_wall: now }
    }

    /// Account for wall time up to `now`. Returns the number of recording
    /// nanoseconds added to the processed offset.
    ///
    /// While playing and not paused the offset grows by
    /// `elapsed * rate`. While paused the interval is discarded. While
    /// stopped the offset and the last clock publication are reset to
    /// zero. Wall time that runs backwards counts as zero.
    pub fn tick(&mut self, now: Instant, state: &PlaybackState) -> i64 {
        let delta = now.saturating_duration_since(self.last_wall);
        self.last_wall = now;

        if !state.is_playing() {
            state.set_processed_offset(0);
            state.set_last_clock_stamp(0);
            return 0;
        }
        if !state.is_advancing() {
            return 0;
        }

        let scaled = delta.as_nanos() as f64 * state.rate();
        let advance = if scaled >= i64::MAX as f64 {
            i64::MAX
        } else {
            scaled as i64
        };
        if advance > 0 {
            state.advance(advance);
        }
        advance
    }
}

// ── Ticker thread ──────────────────────────────────────────────────

/// Body of the `tapedeck-ticker` thread. Runs until `alive` is cleared.
///
/// Sleeps with `park_timeout` so that [`Player::shutdown`](crate::Player::shutdown)
/// can wake it immediately with `unpark`.
pub(crate) fn ticker_loop(state: Arc<PlaybackState>, alive: Arc<AtomicBool>, period: Duration) {
    let mut clock = VirtualClock::new(Instant::now());
    tracing::debug!(?period, "ticker started");

    loop {
        if !alive.load(Ordering::Acquire) {
            break;
        }
        let tick_start = Instant::now();
        clock.tick(tick_start, &state);
        state.doorbell().ring();

        let elapsed = tick_start.elapsed();
        if let Some(remaining) = period.checked_sub(elapsed) {
            thread::park_timeout(remaining);
        }
    }

    tracing::debug!("ticker stopped");
}
