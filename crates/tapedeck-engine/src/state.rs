//! Shared playback state.
//!
//! Every field is an atomic so the control surface, the ticker, and the
//! dispatcher can read and write without a lock. The dispatcher sleeps on
//! a [`Doorbell`] instead of polling; anything that might make a new
//! entry due rings it.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use tapedeck_core::Stamp;

use crate::config::PlayerConfig;

// ── Doorbell ───────────────────────────────────────────────────────

/// A coalescing wakeup signal backed by a `bounded(1)` channel.
///
/// Rings made while one is already pending collapse into it, so a
/// sleeper wakes at most once per burst of rings.
#[derive(Debug)]
pub struct Doorbell {
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl Doorbell {
    /// A doorbell with nothing pending.
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(1);
        Self { tx, rx }
    }

    /// Signal the sleeper. Never blocks.
    pub fn ring(&self) {
        // Full means a ring is already pending. Both ends live in `self`,
        // so the channel never disconnects.
        let _: Result<(), TrySendError<()>> = self.tx.try_send(());
    }

    /// Wait for a ring or until `timeout` passes. Returns whether a ring
    /// was consumed.
    pub fn wait(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(()) => true,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }
}

impl Default for Doorbell {
    fn default() -> Self {
        Self::new()
    }
}

// ── PlaybackState ──────────────────────────────────────────────────

/// Sentinel meaning "no seek pending".
const NO_SEEK: i64 = i64::MIN;

/// Flags and counters shared by every playback thread.
#[derive(Debug)]
pub struct PlaybackState {
    processed_offset: AtomicI64,
    rate_bits: AtomicU64,
    playing: AtomicBool,
    paused: AtomicBool,
    looping: AtomicBool,
    skip_stops: AtomicBool,
    seek_request: AtomicI64,
    last_clock_stamp: AtomicI64,
    current_stamp: AtomicI64,
    doorbell: Doorbell,
}

impl PlaybackState {
    /// Fresh state seeded from `config`. Playback starts stopped;
    /// `auto_start` is honoured by the player once its threads are up.
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            processed_offset: AtomicI64::new(0),
            rate_bits: AtomicU64::new(config.rate.to_bits()),
            playing: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            looping: AtomicBool::new(config.looping),
            skip_stops: AtomicBool::new(config.skip_stops),
            seek_request: AtomicI64::new(NO_SEEK),
            last_clock_stamp: AtomicI64::new(0),
            current_stamp: AtomicI64::new(0),
            doorbell: Doorbell::new(),
        }
    }

    /// Nanoseconds of recording time consumed since the initial stamp.
    pub fn processed_offset(&self) -> i64 {
        self.processed_offset.load(Ordering::Acquire)
    }

    /// Overwrite the processed offset.
    pub fn set_processed_offset(&self, offset: i64) {
        self.processed_offset.store(offset, Ordering::Release);
    }

    /// Advance the processed offset by `delta` nanoseconds.
    pub fn advance(&self, delta: i64) {
        self.processed_offset.fetch_add(delta, Ordering::AcqRel);
    }

    /// Playback speed multiplier.
    pub fn rate(&self) -> f64 {
        f64::from_bits(self.rate_bits.load(Ordering::Relaxed))
    }

    /// Store a new rate. Callers validate it first.
    pub fn set_rate(&self, rate: f64) {
        self.rate_bits.store(rate.to_bits(), Ordering::Relaxed);
    }

    /// Whether playback is running (possibly paused).
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    /// Set the playing flag.
    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Release);
    }

    /// Whether playback is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Set the paused flag.
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }

    /// Whether the virtual clock is currently moving.
    pub fn is_advancing(&self) -> bool {
        self.is_playing() && !self.is_paused()
    }

    /// Whether the timeline restarts when it ends.
    pub fn is_looping(&self) -> bool {
        self.looping.load(Ordering::Relaxed)
    }

    /// Set the loop flag.
    pub fn set_looping(&self, looping: bool) {
        self.looping.store(looping, Ordering::Relaxed);
    }

    /// Whether stop regions are elided.
    pub fn skips_stops(&self) -> bool {
        self.skip_stops.load(Ordering::Relaxed)
    }

    /// Set the stop-skip flag.
    pub fn set_skip_stops(&self, skip: bool) {
        self.skip_stops.store(skip, Ordering::Relaxed);
    }

    /// Ask the dispatcher to reposition to `offset` at its next step.
    /// A later request replaces an earlier one that was not yet taken.
    pub fn request_seek(&self, offset: i64) {
        self.seek_request.store(offset.max(0), Ordering::Release);
    }

    /// Take the pending seek target, clearing it.
    pub fn take_seek_request(&self) -> Option<i64> {
        match self.seek_request.swap(NO_SEEK, Ordering::AcqRel) {
            NO_SEEK => None,
            offset => Some(offset),
        }
    }

    /// Stamp of the last clock publication, or `0` when none has been
    /// made since playback (re)started.
    pub fn last_clock_stamp(&self) -> Stamp {
        self.last_clock_stamp.load(Ordering::Relaxed)
    }

    /// Record a clock publication.
    pub fn set_last_clock_stamp(&self, stamp: Stamp) {
        self.last_clock_stamp.store(stamp, Ordering::Relaxed);
    }

    /// Stamp of the most recently dispatched entry.
    pub fn current_stamp(&self) -> Stamp {
        self.current_stamp.load(Ordering::Relaxed)
    }

    /// Record the most recently dispatched entry.
    pub fn set_current_stamp(&self, stamp: Stamp) {
        self.current_stamp.store(stamp, Ordering::Relaxed);
    }

    /// The dispatcher's wakeup signal.
    pub fn doorbell(&self) -> &Doorbell {
        &self.doorbell
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn doorbell_coalesces_rings() {
        let bell = Doorbell::new();
        bell.ring();
        bell.ring();
        bell.ring();
        assert!(bell.wait(Duration::from_millis(1)));
        assert!(!bell.wait(Duration::from_millis(1)));
    }

    #[test]
    fn doorbell_wakes_a_waiting_thread() {
        let bell = Arc::new(Doorbell::new());
        let waiter = {
            let bell = Arc::clone(&bell);
            thread::spawn(move || {
                let start = Instant::now();
                let rang = bell.wait(Duration::from_secs(5));
                (rang, start.elapsed())
            })
        };
        thread::sleep(Duration::from_millis(20));
        bell.ring();
        let (rang, elapsed) = waiter.join().unwrap();
        assert!(rang);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn seek_request_is_taken_once() {
        let state = PlaybackState::new(&PlayerConfig::default());
        assert_eq!(state.take_seek_request(), None);
        state.request_seek(10);
        state.request_seek(20);
        assert_eq!(state.take_seek_request(), Some(20));
        assert_eq!(state.take_seek_request(), None);
    }

    #[test]
    fn initial_flags_follow_config() {
        let config = PlayerConfig {
            rate: 2.5,
            looping: true,
            skip_stops: false,
            ..PlayerConfig::default()
        };
        let state = PlaybackState::new(&config);
        assert_eq!(state.rate(), 2.5);
        assert!(state.is_looping());
        assert!(!state.skips_stops());
        assert!(!state.is_playing());
        assert!(!state.is_advancing());
    }

    #[test]
    fn advancing_requires_playing_and_not_paused() {
        let state = PlaybackState::new(&PlayerConfig::default());
        state.set_playing(true);
        assert!(state.is_advancing());
        state.set_paused(true);
        assert!(!state.is_advancing());
    }
}
