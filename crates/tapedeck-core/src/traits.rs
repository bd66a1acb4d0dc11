//! Collaborator traits at the edges of the playback engine.

use crate::error::ResolveError;
use crate::payload::Payload;
use crate::sensor::SensorKind;
use crate::Stamp;

/// Turns a timestamp into a heavy payload.
///
/// Implemented by the dataset crate for on-disk lidar and radar
/// directories, and by in-memory mocks in tests. Loads are synchronous
/// and only ever called from the owning sensor worker's thread.
pub trait PayloadResolver: Send {
    /// The file-list identifier for a timestamp (e.g. `"1234.bin"`).
    fn identifier(&self, stamp: Stamp) -> String;

    /// Load and decode the record named by `identifier`.
    fn load(&self, identifier: &str) -> Result<Payload, ResolveError>;
}

/// Receives everything the engine publishes.
///
/// Fire-and-forget: the engine never waits on a sink and assumes no
/// backpressure. Called concurrently from every worker thread and the
/// dispatcher thread.
pub trait EmitSink: Send + Sync {
    /// A sensor payload, tagged with its original timestamp.
    fn emit(&self, sensor: SensorKind, stamp: Stamp, payload: Payload);

    /// Periodic progress heartbeat carrying the latest dispatched stamp.
    fn progress(&self, _stamp: Stamp) {}

    /// Simulated clock publication.
    fn clock(&self, _stamp: Stamp) {}
}
