//! The dispatcher: walks the timeline against the virtual clock.
//!
//! [`Cursor`] is the whole decision procedure as a pure state machine:
//! each [`Cursor::step`] call inspects the shared [`PlaybackState`] and
//! reports one [`Step`]. The dispatcher thread only acts on those steps
//! (routing entries, flushing queues, sleeping on the doorbell), which
//! keeps every timing rule testable without threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tapedeck_core::{EmitSink, SensorKind, Stamp};
use tapedeck_timeline::{StopRegion, StopRegions, Timeline, TimelineEntry};

use crate::queue::SensorQueue;
use crate::state::PlaybackState;

/// Upper bound on a doorbell wait, so a missed ring costs at most this.
const IDLE_WAIT: Duration = Duration::from_millis(50);

// ── Step ───────────────────────────────────────────────────────────

/// What one [`Cursor::step`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// The entry was due; hand it to its sensor.
    Dispatched(TimelineEntry),
    /// The next entry is not due yet.
    Wait,
    /// The next entry fell inside this stop region, which was elided.
    SkippedStop(StopRegion),
    /// A seek request moved the cursor to `position`.
    Seeked {
        /// New timeline index.
        position: usize,
    },
    /// Playback was stopped (or restarted after the end); the cursor is
    /// back at the first entry.
    Rewound,
    /// The end was reached with looping on; playback restarts at offset 0.
    Looped,
    /// The end was reached with looping off; playback has stopped.
    Ended,
    /// Still at the end, waiting for an external start.
    EndPaused,
}

// ── Cursor ─────────────────────────────────────────────────────────

/// Position of the dispatcher within the timeline and its stop regions.
#[derive(Debug)]
pub struct Cursor {
    timeline: Arc<Timeline>,
    stops: Arc<StopRegions>,
    position: usize,
    stop_cursor: usize,
    ended: bool,
}

impl Cursor {
    /// A cursor at the first entry and first stop region.
    pub fn new(timeline: Arc<Timeline>, stops: Arc<StopRegions>) -> Self {
        Self {
            timeline,
            stops,
            position: 0,
            stop_cursor: 0,
            ended: false,
        }
    }

    /// Index of the next entry to consider.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Index of the next stop region that can still apply.
    pub fn stop_cursor(&self) -> usize {
        self.stop_cursor
    }

    /// Whether the cursor has run off the end without looping.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    fn rewind(&mut self) {
        self.position = 0;
        self.stop_cursor = 0;
        self.ended = false;
    }

    /// Rewind and restart the playhead, so nothing up to the old offset
    /// is replayed at once.
    fn rewind_to_zero(&mut self, state: &PlaybackState) {
        self.rewind();
        state.set_processed_offset(0);
        state.set_last_clock_stamp(0);
    }

    fn at_start(&self) -> bool {
        self.position == 0 && self.stop_cursor == 0
    }

    /// Advance the state machine by one decision.
    pub fn step(&mut self, state: &PlaybackState) -> Step {
        let timeline = Arc::clone(&self.timeline);
        let initial = timeline.initial_stamp();

        if let Some(offset) = state.take_seek_request() {
            state.set_processed_offset(offset);
            let target = initial.saturating_add(offset);
            self.position = timeline.position_at_or_before(target);
            let stamp = timeline.entries()[self.position].stamp;
            self.stop_cursor = self.stops.first_at_or_after(stamp);
            self.ended = false;
            return Step::Seeked {
                position: self.position,
            };
        }

        if self.ended {
            if state.is_playing() {
                self.rewind_to_zero(state);
                return Step::Rewound;
            }
            return Step::EndPaused;
        }

        if !state.is_playing() && !self.at_start() {
            self.rewind_to_zero(state);
            return Step::Rewound;
        }

        let Some(&entry) = timeline.get(self.position) else {
            if state.is_looping() {
                self.rewind();
                state.set_processed_offset(0);
                return Step::Looped;
            }
            self.ended = true;
            state.set_playing(false);
            return Step::Ended;
        };

        if entry.stamp > initial.saturating_add(state.processed_offset()) {
            return Step::Wait;
        }

        while let Some(region) = self.stops.get(self.stop_cursor) {
            if region.end >= entry.stamp {
                break;
            }
            self.stop_cursor += 1;
        }

        if let Some(&region) = self.stops.get(self.stop_cursor) {
            if region.start <= entry.stamp {
                self.stop_cursor += 1;
                if state.skips_stops() {
                    self.position = timeline.first_after(region.end);
                    state.set_processed_offset(timeline.relative(region.end));
                    return Step::SkippedStop(region);
                }
            }
        }

        self.position += 1;
        Step::Dispatched(entry)
    }
}

// ── Router ─────────────────────────────────────────────────────────

/// Sensor queues indexed by [`SensorKind::index`]; `None` for disabled
/// sensors.
#[derive(Clone, Debug, Default)]
pub(crate) struct Router {
    queues: [Option<Arc<SensorQueue>>; 4],
}

impl Router {
    pub(crate) fn insert(&mut self, sensor: SensorKind, queue: Arc<SensorQueue>) {
        self.queues[sensor.index()] = Some(queue);
    }

    pub(crate) fn route(&self, entry: TimelineEntry) -> bool {
        match &self.queues[entry.sensor.index()] {
            Some(queue) => {
                queue.push(entry.stamp);
                true
            }
            None => false,
        }
    }

    pub(crate) fn flush(&self) -> usize {
        self.queues.iter().flatten().map(|q| q.flush()).sum()
    }

    pub(crate) fn close(&self) {
        for queue in self.queues.iter().flatten() {
            queue.close();
        }
    }
}

// ── Dispatcher thread ──────────────────────────────────────────────

/// Publication cadence for the dispatcher thread.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Cadence {
    pub(crate) heartbeat_every: u64,
    pub(crate) clock_interval_ns: i64,
}

/// Body of the `tapedeck-dispatch` thread. Returns the number of entries
/// dispatched.
pub(crate) fn dispatcher_loop(
    mut cursor: Cursor,
    state: Arc<PlaybackState>,
    router: Router,
    sink: Arc<dyn EmitSink>,
    alive: Arc<AtomicBool>,
    cadence: Cadence,
) -> u64 {
    tracing::debug!("dispatcher started");
    let mut dispatched = 0u64;

    while alive.load(Ordering::Acquire) {
        match cursor.step(&state) {
            Step::Dispatched(entry) => {
                state.set_current_stamp(entry.stamp);
                if !router.route(entry) {
                    tracing::trace!(sensor = %entry.sensor, stamp = entry.stamp, "sensor disabled");
                }
                dispatched += 1;
                if dispatched % cadence.heartbeat_every == 0 {
                    sink.progress(entry.stamp);
                }
                publish_clock(&state, sink.as_ref(), entry.stamp, cadence.clock_interval_ns);
            }
            Step::Wait | Step::EndPaused => {
                state.doorbell().wait(IDLE_WAIT);
            }
            Step::SkippedStop(region) => {
                tracing::debug!(start = region.start, end = region.end, "skipped stop region");
            }
            Step::Seeked { position } => {
                let flushed = router.flush();
                tracing::debug!(position, flushed, "seeked");
            }
            Step::Rewound => {
                let flushed = router.flush();
                tracing::debug!(flushed, "rewound to start");
            }
            Step::Looped => tracing::info!("end of timeline, looping"),
            Step::Ended => tracing::info!(dispatched, "end of timeline"),
        }
    }

    tracing::debug!(dispatched, "dispatcher stopped");
    dispatched
}

fn publish_clock(state: &PlaybackState, sink: &dyn EmitSink, stamp: Stamp, interval: i64) {
    let last = state.last_clock_stamp();
    if last == 0 || stamp.saturating_sub(last) > interval {
        sink.clock(stamp);
        state.set_last_clock_stamp(stamp);
    }
}
