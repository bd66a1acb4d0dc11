//! Playback synchronization engine.
//!
//! Replays a recorded multi-sensor [`Timeline`](tapedeck_timeline::Timeline)
//! against a virtual clock. One dispatcher thread walks the timeline and
//! hands each due timestamp to the queue of its sensor; one worker thread
//! per sensor resolves the payload and emits it through an
//! [`EmitSink`](tapedeck_core::EmitSink).
//!
//! # Architecture
//!
//! ```text
//! Controls (any thread)   Ticker            Dispatcher               Workers (one per sensor)
//!     |                     |                   |                          |
//!     |--start/seek/rate--->| PlaybackState     |                          |
//!     |   (atomics)         | offset += dt*rate |                          |
//!     |--ring doorbell------+------------------>| Cursor::step()           |
//!     |                     |--ring doorbell--->| wait while entry not due |
//!     |                     |                   | stop regions / seek/loop |
//!     |                     |                   |--SensorQueue::push------>| wait_batch()
//!     |                     |                   |                          | resolve (+prefetch)
//!     |                     |                   |                          | sink.emit()
//! ```
//!
//! [`Player`] owns every thread and tears them down on
//! [`shutdown`](Player::shutdown) or drop.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod clock;
pub mod config;
pub mod control;
pub mod dispatch;
pub mod player;
pub mod prefetch;
pub mod queue;
pub mod state;
pub mod worker;

pub use clock::VirtualClock;
pub use config::{ConfigError, PlayerConfig};
pub use control::{ControlError, Controls};
pub use dispatch::{Cursor, Step};
pub use player::{Feed, Feeds, Player, ShutdownReport};
pub use prefetch::{PrefetchSlot, PrefetchStats, PrefetchingResolver};
pub use queue::SensorQueue;
pub use state::{Doorbell, PlaybackState};
pub use worker::{RecordTable, StampHandler};
