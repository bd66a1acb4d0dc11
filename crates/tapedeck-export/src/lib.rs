//! Binary record export for tapedeck recordings.
//!
//! Converts a recording's IMU samples and lidar scans into a single
//! self-checking record file that other tools can stream without a CSV
//! parser or a directory walk.
//!
//! # Architecture
//!
//! - [`ExportWriter`] writes frames to any `Write` sink
//! - [`ExportReader`] reads and verifies frames from any `Read` source
//! - [`export_dataset`] walks a [`Dataset`](tapedeck_dataset::Dataset):
//!   every IMU record, then every lidar file in list order
//!
//! # Format
//!
//! ```text
//! [MAGIC "TDCK"] [VERSION u8] [source: u32 len + UTF-8]
//! [Frame 1] [Frame 2] ... [Frame N]
//! ```
//!
//! Each frame is `[channel u8] [stamp i64] [len u32] [payload] [fnv1a u64]`,
//! the checksum covering channel, stamp and payload bytes. Payloads are
//! capped at [`codec::MAX_FRAME_BYTES`]; a longer prefix is rejected
//! before anything is allocated.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod export;
pub mod reader;
pub mod types;
pub mod writer;

pub use error::ExportError;
pub use export::{export_dataset, export_to_path, ExportSummary};
pub use reader::{ExportReader, FrameIter};
pub use types::{Channel, Frame};
pub use writer::ExportWriter;

/// Magic bytes at the start of every export file.
pub const MAGIC: [u8; 4] = *b"TDCK";

/// Current binary format version.
pub const FORMAT_VERSION: u8 = 1;
