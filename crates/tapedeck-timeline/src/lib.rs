//! Sorted timeline index, stop regions and heavy-sensor file lists.
//!
//! Everything in this crate is built once before playback starts and is
//! read-only afterwards, so it is shared between threads behind `Arc`
//! without locking.
//!
//! - [`Timeline`] is a sorted array of [`TimelineEntry`] with binary
//!   search for seeking.
//! - [`StopRegions`] holds the disjoint `[start, end]` intervals that
//!   playback may elide.
//! - [`FileList`] is the ordered file-name list of a heavy sensor, with
//!   a windowed search that favours sequential access.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod files;
pub mod stop;
pub mod timeline;

pub use error::TimelineError;
pub use files::FileList;
pub use stop::{StopRegion, StopRegions};
pub use timeline::{Timeline, TimelineEntry, SEEK_SCALE};
