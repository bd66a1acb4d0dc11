//! Errors raised while loading a recording directory.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use tapedeck_timeline::TimelineError;

/// Fatal problems with a recording directory.
///
/// Only the stamp index is mandatory. Missing optional inputs are logged
/// and treated as empty, and malformed lines are counted in the
/// [`LoadReport`](crate::LoadReport), so neither shows up here.
#[derive(Debug)]
pub enum DatasetError {
    /// `data_stamp.csv` does not exist.
    MissingStampIndex {
        /// Where it was expected.
        path: PathBuf,
    },
    /// A file or directory could not be read.
    Io {
        /// The path being read.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
    /// A CSV file could not be read.
    Csv {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        source: csv::Error,
    },
    /// The stamp index or stop regions are structurally invalid.
    Timeline(TimelineError),
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStampIndex { path } => {
                write!(f, "stamp index not found at {}", path.display())
            }
            Self::Io { path, source } => write!(f, "failed to read {}: {source}", path.display()),
            Self::Csv { path, source } => write!(f, "failed to parse {}: {source}", path.display()),
            Self::Timeline(e) => write!(f, "invalid recording: {e}"),
        }
    }
}

impl Error for DatasetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Timeline(e) => Some(e),
            Self::MissingStampIndex { .. } => None,
        }
    }
}

impl From<TimelineError> for DatasetError {
    fn from(e: TimelineError) -> Self {
        Self::Timeline(e)
    }
}
