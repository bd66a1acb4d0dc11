//! Sensor workers: turn dispatched stamps into emitted payloads.
//!
//! Each enabled sensor gets one worker thread running [`worker_loop`]
//! over its [`SensorQueue`]. What a stamp turns into is decided by the
//! worker's [`StampHandler`]: an in-memory [`RecordTable`] for GPS and
//! IMU, or a [`PrefetchingResolver`](crate::PrefetchingResolver) for the
//! file-backed sensors.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tapedeck_core::{EmitSink, Payload, SensorKind, Stamp};

use crate::queue::SensorQueue;

/// Per-sensor strategy for handling one dispatched stamp.
pub trait StampHandler: Send {
    /// The sensor this handler serves.
    fn sensor(&self) -> SensorKind;

    /// Resolve `stamp` and emit whatever it yields through `sink`.
    /// Unresolvable stamps are skipped.
    fn handle(&mut self, stamp: Stamp, sink: &dyn EmitSink);
}

// ── RecordTable ────────────────────────────────────────────────────

/// Pre-parsed records of a lightweight sensor, keyed by stamp.
#[derive(Clone, Debug)]
pub struct RecordTable {
    sensor: SensorKind,
    records: HashMap<Stamp, Payload>,
}

impl RecordTable {
    /// An empty table for `sensor`.
    pub fn new(sensor: SensorKind) -> Self {
        Self {
            sensor,
            records: HashMap::new(),
        }
    }

    /// Insert or replace the record at `stamp`.
    pub fn insert(&mut self, stamp: Stamp, payload: Payload) {
        self.records.insert(stamp, payload);
    }

    /// The record at `stamp`.
    pub fn get(&self, stamp: Stamp) -> Option<&Payload> {
        self.records.get(&stamp)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl StampHandler for RecordTable {
    fn sensor(&self) -> SensorKind {
        self.sensor
    }

    fn handle(&mut self, stamp: Stamp, sink: &dyn EmitSink) {
        let Some(payload) = self.records.get(&stamp) else {
            tracing::trace!(sensor = %self.sensor, stamp, "no record for stamp");
            return;
        };
        let magnetic = match payload {
            Payload::Imu(sample) => sample.magnetic_field,
            _ => None,
        };
        sink.emit(self.sensor, stamp, payload.clone());
        if let Some(field) = magnetic {
            sink.emit(self.sensor, stamp, Payload::Magnetic(field));
        }
    }
}

// ── Worker loop ────────────────────────────────────────────────────

/// Body of a `tapedeck-<sensor>` thread. Returns the number of stamps
/// handled.
///
/// Exits when the queue is closed. A batch taken just before shutdown is
/// abandoned at the next stamp boundary.
pub(crate) fn worker_loop(
    queue: Arc<SensorQueue>,
    mut handler: Box<dyn StampHandler>,
    sink: Arc<dyn EmitSink>,
    alive: Arc<AtomicBool>,
) -> u64 {
    let sensor = handler.sensor();
    tracing::debug!(%sensor, "worker started");
    let mut handled = 0u64;

    'outer: while let Some(batch) = queue.wait_batch() {
        for stamp in batch {
            if !alive.load(Ordering::Acquire) {
                break 'outer;
            }
            handler.handle(stamp, sink.as_ref());
            handled += 1;
        }
    }

    tracing::debug!(%sensor, handled, "worker stopped");
    handled
}
