//! Errors raised while building a timeline or its stop regions.

use std::error::Error;
use std::fmt;

use tapedeck_core::Stamp;

use crate::stop::StopRegion;

/// Structural problems with loaded timeline data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimelineError {
    /// The timeline has no entries.
    Empty,
    /// An entry is stamped earlier than the one before it.
    Unsorted {
        /// Index of the offending entry.
        index: usize,
        /// Stamp of the preceding entry.
        previous: Stamp,
        /// Stamp of the offending entry.
        stamp: Stamp,
    },
    /// A stop region ends before it starts.
    InvertedStopRegion {
        /// Region start.
        start: Stamp,
        /// Region end.
        end: Stamp,
    },
    /// Two stop regions share at least one stamp.
    OverlappingStopRegions {
        /// The earlier region.
        first: StopRegion,
        /// The region that overlaps it.
        second: StopRegion,
    },
}

impl fmt::Display for TimelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "timeline has no entries"),
            Self::Unsorted {
                index,
                previous,
                stamp,
            } => write!(
                f,
                "timeline entry {index} (stamp {stamp}) precedes the entry before it (stamp {previous})"
            ),
            Self::InvertedStopRegion { start, end } => {
                write!(f, "stop region [{start}, {end}] ends before it starts")
            }
            Self::OverlappingStopRegions { first, second } => write!(
                f,
                "stop regions [{}, {}] and [{}, {}] overlap",
                first.start, first.end, second.start, second.end
            ),
        }
    }
}

impl Error for TimelineError {}
