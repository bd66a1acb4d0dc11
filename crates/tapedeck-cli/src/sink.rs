//! An [`EmitSink`] that reports every emission through `tracing`.

use std::sync::atomic::{AtomicU64, Ordering};

use tapedeck::types::{EmitSink, Payload, SensorKind, Stamp};

/// Logs one line per emitted payload and counts them.
#[derive(Debug, Default)]
pub struct LogSink {
    emitted: AtomicU64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads emitted so far.
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }
}

/// A one-number size for the log line: points, pixels, or 1.
fn size(payload: &Payload) -> usize {
    match payload {
        Payload::Lidar(cloud) => cloud.len(),
        Payload::Radar(img) => img.pixels.len(),
        _ => 1,
    }
}

impl EmitSink for LogSink {
    fn emit(&self, sensor: SensorKind, stamp: Stamp, payload: Payload) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            target: "tapedeck::emit",
            %sensor,
            stamp,
            kind = payload.kind_name(),
            size = size(&payload)
        );
    }

    fn progress(&self, stamp: Stamp) {
        tracing::debug!(target: "tapedeck::progress", stamp);
    }

    fn clock(&self, stamp: Stamp) {
        tracing::trace!(target: "tapedeck::clock", stamp);
    }
}
