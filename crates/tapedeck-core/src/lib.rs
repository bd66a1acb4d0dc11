//! Core sensor, payload and collaborator types for tapedeck playback.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the rest of the workspace: sensor kinds,
//! decoded payload values, the [`PayloadResolver`] and [`EmitSink`]
//! collaborator traits, and resolution errors.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod digest;
pub mod error;
pub mod payload;
pub mod sensor;
pub mod traits;

pub use digest::payload_digest;
pub use error::ResolveError;
pub use payload::{
    GpsFix, ImuSample, Payload, PointCloud, PointXyzirt, PolarImage, Quaternion, Vector3,
};
pub use sensor::{SensorKind, SensorSet, UnknownSensorTag};
pub use traits::{EmitSink, PayloadResolver};

/// Nanosecond timestamp as recorded in the dataset.
pub type Stamp = i64;
