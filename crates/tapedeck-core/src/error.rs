//! Payload resolution errors.
//!
//! None of these are fatal to playback: a worker that receives one logs
//! it and skips the timestamp.

use std::error::Error;
use std::fmt;
use std::io;

/// Errors from [`PayloadResolver::load`](crate::PayloadResolver::load).
#[derive(Debug)]
pub enum ResolveError {
    /// No record exists for the identifier.
    NotFound {
        /// The identifier that was requested.
        identifier: String,
    },
    /// The record exists but could not be read.
    Io {
        /// The identifier that was requested.
        identifier: String,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// The record was read but its contents could not be decoded.
    Decode {
        /// The identifier that was requested.
        identifier: String,
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl ResolveError {
    /// The identifier the failed request was for.
    pub fn identifier(&self) -> &str {
        match self {
            Self::NotFound { identifier }
            | Self::Io { identifier, .. }
            | Self::Decode { identifier, .. } => identifier,
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { identifier } => write!(f, "record '{identifier}' not found"),
            Self::Io { identifier, source } => {
                write!(f, "failed to read record '{identifier}': {source}")
            }
            Self::Decode { identifier, reason } => {
                write!(f, "failed to decode record '{identifier}': {reason}")
            }
        }
    }
}

impl Error for ResolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
