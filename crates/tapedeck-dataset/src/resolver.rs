//! Heavy-sensor payloads read from a directory of `<stamp>.<ext>` files.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tapedeck_core::{Payload, PayloadResolver, ResolveError, Stamp};

use crate::decode::{decode_point_cloud, decode_polar_image};

type Decoder = fn(&[u8]) -> Result<Payload, String>;

fn lidar_payload(bytes: &[u8]) -> Result<Payload, String> {
    Ok(Payload::Lidar(decode_point_cloud(bytes)))
}

fn radar_payload(bytes: &[u8]) -> Result<Payload, String> {
    decode_polar_image(bytes)
        .map(Payload::Radar)
        .map_err(|e| e.to_string())
}

/// Resolves stamps to files in one directory and decodes them.
///
/// Files are read on every call; caching is left to the playback
/// engine's prefetch slot.
#[derive(Clone)]
pub struct DirectoryResolver {
    dir: PathBuf,
    extension: &'static str,
    decode: Decoder,
}

impl DirectoryResolver {
    /// Lidar scans: `<dir>/<stamp>.bin`.
    pub fn lidar(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: "bin",
            decode: lidar_payload,
        }
    }

    /// Polar radar frames: `<dir>/<stamp>.png`.
    pub fn radar(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: "png",
            decode: radar_payload,
        }
    }

    /// The directory files are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        self.extension
    }

    /// Read the raw bytes behind `identifier`.
    pub fn read(&self, identifier: &str) -> Result<Vec<u8>, ResolveError> {
        fs::read(self.dir.join(identifier)).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ResolveError::NotFound {
                    identifier: identifier.to_string(),
                }
            } else {
                ResolveError::Io {
                    identifier: identifier.to_string(),
                    source,
                }
            }
        })
    }
}

impl PayloadResolver for DirectoryResolver {
    fn identifier(&self, stamp: Stamp) -> String {
        format!("{stamp}.{}", self.extension)
    }

    fn load(&self, identifier: &str) -> Result<Payload, ResolveError> {
        let bytes = self.read(identifier)?;
        (self.decode)(&bytes).map_err(|reason| ResolveError::Decode {
            identifier: identifier.to_string(),
            reason,
        })
    }
}

impl fmt::Debug for DirectoryResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryResolver")
            .field("dir", &self.dir)
            .field("extension", &self.extension)
            .finish()
    }
}
