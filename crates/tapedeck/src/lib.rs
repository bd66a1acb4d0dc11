//! Tapedeck: multi-sensor timeline playback for recorded driving datasets.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all tapedeck sub-crates, and wires a loaded [`Dataset`](dataset::Dataset)
//! to a running [`Player`](engine::Player) through [`Session`].
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tapedeck::prelude::*;
//!
//! struct Print;
//! impl EmitSink for Print {
//!     fn emit(&self, sensor: SensorKind, stamp: Stamp, payload: Payload) {
//!         println!("{sensor} {stamp} {}", payload.kind_name());
//!     }
//! }
//!
//! let session = Session::open("/data/urban08", Arc::new(Print), PlayerConfig::default()).unwrap();
//! session.controls().set_rate(2.0).unwrap();
//! std::thread::sleep(std::time::Duration::from_secs(5));
//! let report = session.shutdown();
//! println!("{} entries dispatched", report.entries_dispatched);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tapedeck-core` | Sensor kinds, payloads, collaborator traits |
//! | [`timeline`] | `tapedeck-timeline` | Timeline index, stop regions, file lists |
//! | [`engine`] | `tapedeck-engine` | Clock, dispatcher, workers, controls |
//! | [`dataset`] | `tapedeck-dataset` | On-disk loader and decoders |
//! | [`export`] | `tapedeck-export` | Binary IMU/lidar record export |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod session;

pub use session::{feeds_for, Session, SessionError};

/// Sensor kinds, payload values and collaborator traits (`tapedeck-core`).
pub use tapedeck_core as types;

/// Timeline index, stop regions and heavy-sensor file lists
/// (`tapedeck-timeline`).
pub use tapedeck_timeline as timeline;

/// The playback engine (`tapedeck-engine`).
///
/// [`engine::Player`] owns the ticker, dispatcher and worker threads;
/// [`engine::Controls`] drives it from any thread.
pub use tapedeck_engine as engine;

/// Recording directory loader and lidar/radar decoders
/// (`tapedeck-dataset`).
pub use tapedeck_dataset as dataset;

/// Binary record export (`tapedeck-export`).
pub use tapedeck_export as export;

/// Common imports for typical tapedeck usage.
///
/// ```rust
/// use tapedeck::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use tapedeck_core::{
        EmitSink, Payload, PayloadResolver, ResolveError, SensorKind, SensorSet, Stamp,
    };

    // Timeline
    pub use tapedeck_timeline::{FileList, StopRegion, StopRegions, Timeline, TimelineEntry};

    // Engine
    pub use tapedeck_engine::{
        ConfigError, ControlError, Controls, Feeds, Player, PlayerConfig, RecordTable,
        ShutdownReport,
    };

    // Dataset
    pub use tapedeck_dataset::{Dataset, DatasetError};

    // Session
    pub use crate::session::{Session, SessionError};
}
