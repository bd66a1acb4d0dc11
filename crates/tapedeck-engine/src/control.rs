//! Cloneable control surface for a running player.
//!
//! Every setter writes the shared atomics and rings the dispatcher's
//! doorbell, so the change takes effect at its next step rather than at
//! the next clock tick.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use tapedeck_core::Stamp;
use tapedeck_timeline::{Timeline, SEEK_SCALE};

use crate::state::PlaybackState;

// ── ControlError ───────────────────────────────────────────────────

/// A rejected control request. The state is left unchanged.
#[derive(Debug, PartialEq)]
pub enum ControlError {
    /// The rate was NaN, infinite, or negative.
    InvalidRate {
        /// The rejected value.
        value: f64,
    },
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRate { value } => {
                write!(f, "rate must be finite and non-negative, got {value}")
            }
        }
    }
}

impl Error for ControlError {}

// ── Controls ───────────────────────────────────────────────────────

/// Handle for steering playback from any thread.
#[derive(Clone, Debug)]
pub struct Controls {
    state: Arc<PlaybackState>,
    timeline: Arc<Timeline>,
}

impl Controls {
    /// Controls over `state` for playback of `timeline`.
    pub fn new(state: Arc<PlaybackState>, timeline: Arc<Timeline>) -> Self {
        Self { state, timeline }
    }

    fn notify(&self) {
        self.state.doorbell().ring();
    }

    /// Start (or restart after the end) and clear any pause.
    pub fn start(&self) {
        self.state.set_paused(false);
        self.state.set_playing(true);
        tracing::info!("playback started");
        self.notify();
    }

    /// Stop playback. The offset returns to zero and the dispatcher
    /// rewinds to the first entry.
    pub fn stop(&self) {
        self.state.set_playing(false);
        self.state.set_paused(false);
        self.state.set_processed_offset(0);
        self.state.set_last_clock_stamp(0);
        tracing::info!("playback stopped");
        self.notify();
    }

    /// Freeze the virtual clock without losing the position.
    pub fn pause(&self) {
        self.state.set_paused(true);
        self.notify();
    }

    /// Undo [`pause`](Self::pause).
    pub fn resume(&self) {
        self.state.set_paused(false);
        self.notify();
    }

    /// Jump to `position` parts per 10 000 of the timeline's duration.
    ///
    /// Only `0 < position < 10000` is accepted; anything else is ignored
    /// and `false` is returned.
    pub fn seek(&self, position: u32) -> bool {
        let Some(offset) = self.timeline.seek_offset(position) else {
            tracing::debug!(position, "seek out of range ignored");
            return false;
        };
        self.state.request_seek(offset);
        self.state.set_processed_offset(offset);
        tracing::debug!(position, offset, "seek requested");
        self.notify();
        true
    }

    /// Change the playback speed. `0.0` stalls playback.
    pub fn set_rate(&self, rate: f64) -> Result<(), ControlError> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(ControlError::InvalidRate { value: rate });
        }
        self.state.set_rate(rate);
        self.notify();
        Ok(())
    }

    /// Turn looping on or off.
    pub fn set_loop(&self, looping: bool) {
        self.state.set_looping(looping);
        self.notify();
    }

    /// Turn stop-region skipping on or off.
    pub fn set_skip_stops(&self, skip: bool) {
        self.state.set_skip_stops(skip);
        self.notify();
    }

    /// Recording nanoseconds consumed since the initial stamp.
    pub fn processed_offset(&self) -> i64 {
        self.state.processed_offset()
    }

    /// Whether playback is running (possibly paused).
    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// Whether playback is paused.
    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    /// Current speed multiplier.
    pub fn rate(&self) -> f64 {
        self.state.rate()
    }

    /// Whether looping is on.
    pub fn is_looping(&self) -> bool {
        self.state.is_looping()
    }

    /// Whether stop regions are skipped.
    pub fn skips_stops(&self) -> bool {
        self.state.skips_stops()
    }

    /// Stamp of the most recently dispatched entry (`0` before the first).
    pub fn current_stamp(&self) -> Stamp {
        self.state.current_stamp()
    }

    /// The playhead in the same 0..10 000 scale that [`seek`](Self::seek)
    /// takes.
    pub fn position(&self) -> u32 {
        let duration = self.timeline.duration();
        if duration <= 0 {
            return 0;
        }
        let offset = self.processed_offset().clamp(0, duration);
        (offset as i128 * SEEK_SCALE as i128 / duration as i128) as u32
    }

    /// The timeline being played.
    pub fn timeline(&self) -> &Arc<Timeline> {
        &self.timeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use std::time::Duration;
    use tapedeck_core::SensorKind;
    use tapedeck_timeline::TimelineEntry;

    fn controls() -> Controls {
        let timeline = Timeline::new(vec![
            TimelineEntry::new(1_000, SensorKind::Gps),
            TimelineEntry::new(11_000, SensorKind::Imu),
        ])
        .unwrap();
        Controls::new(
            Arc::new(PlaybackState::new(&PlayerConfig::default())),
            Arc::new(timeline),
        )
    }

    #[test]
    fn start_stop_pause_resume() {
        let c = controls();
        c.start();
        assert!(c.is_playing() && !c.is_paused());
        c.pause();
        assert!(c.is_paused());
        c.resume();
        assert!(!c.is_paused());
        c.pause();
        c.start();
        assert!(!c.is_paused());
        c.stop();
        assert!(!c.is_playing());
    }

    #[test]
    fn setters_ring_the_doorbell() {
        let c = controls();
        c.set_loop(true);
        assert!(c.state.doorbell().wait(Duration::from_millis(1)));
        assert!(c.is_looping());
    }

    #[test]
    fn seek_sets_offset_and_request() {
        let c = controls();
        assert!(c.seek(5_000));
        assert_eq!(c.processed_offset(), 5_000);
        assert_eq!(c.state.take_seek_request(), Some(5_000));
        assert_eq!(c.position(), 5_000);
    }

    #[test]
    fn out_of_range_seek_is_ignored() {
        let c = controls();
        assert!(!c.seek(0));
        assert!(!c.seek(10_000));
        assert!(!c.seek(u32::MAX));
        assert_eq!(c.state.take_seek_request(), None);
        assert_eq!(c.processed_offset(), 0);
    }

    #[test]
    fn invalid_rate_leaves_rate_unchanged() {
        let c = controls();
        c.set_rate(3.0).unwrap();
        assert_eq!(
            c.set_rate(-0.5),
            Err(ControlError::InvalidRate { value: -0.5 })
        );
        assert!(c.set_rate(f64::NAN).is_err());
        assert_eq!(c.rate(), 3.0);
        c.set_rate(0.0).unwrap();
        assert_eq!(c.rate(), 0.0);
    }

    #[test]
    fn clones_share_state() {
        let a = controls();
        let b = a.clone();
        a.set_skip_stops(false);
        assert!(!b.skips_stops());
    }
}
