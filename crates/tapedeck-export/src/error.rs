//! Error types for the export format.

use std::fmt;
use std::io;

use tapedeck_core::Stamp;

/// Errors that can occur while writing or reading an export file.
#[derive(Debug)]
pub enum ExportError {
    /// An I/O error occurred during read or write.
    Io(io::Error),
    /// The file does not start with the expected `b"TDCK"` magic bytes.
    InvalidMagic,
    /// The format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the file.
        found: u8,
    },
    /// A frame could not be decoded (truncated or corrupt data).
    MalformedFrame {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// A frame's channel tag is not recognized.
    UnknownChannel {
        /// The unrecognized tag.
        tag: u8,
    },
    /// A frame's stored checksum does not match its contents.
    ChecksumMismatch {
        /// Stamp of the offending frame.
        stamp: Stamp,
        /// Checksum stored in the file.
        recorded: u64,
        /// Checksum computed from the frame as read.
        computed: u64,
    },
    /// A payload or length prefix exceeds the format's size limit.
    PayloadTooLarge {
        /// Payload length in bytes.
        len: usize,
        /// The limit it exceeds.
        limit: usize,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidMagic => write!(f, "invalid magic bytes (expected b\"TDCK\")"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported format version {found}")
            }
            Self::MalformedFrame { detail } => write!(f, "malformed frame: {detail}"),
            Self::UnknownChannel { tag } => write!(f, "unknown channel tag {tag}"),
            Self::ChecksumMismatch {
                stamp,
                recorded,
                computed,
            } => {
                write!(
                    f,
                    "checksum mismatch at stamp {stamp}: \
                     recorded={recorded:#018x}, computed={computed:#018x}"
                )
            }
            Self::PayloadTooLarge { len, limit } => {
                write!(f, "payload of {len} bytes exceeds the {limit}-byte limit")
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ExportError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
