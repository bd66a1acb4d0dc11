//! Data types for export frames.

use tapedeck_core::digest::{fnv1a_bytes, FNV_OFFSET};
use tapedeck_core::{SensorKind, Stamp};

use crate::error::ExportError;

/// Which stream a frame belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Channel {
    /// An encoded [`ImuSample`](tapedeck_core::ImuSample).
    Imu = 1,
    /// An encoded [`PointCloud`](tapedeck_core::PointCloud).
    Lidar = 2,
}

impl Channel {
    /// The on-disk tag.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// The sensor this channel carries.
    pub fn sensor(self) -> SensorKind {
        match self {
            Self::Imu => SensorKind::Imu,
            Self::Lidar => SensorKind::Lidar,
        }
    }
}

impl TryFrom<u8> for Channel {
    type Error = ExportError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            1 => Ok(Self::Imu),
            2 => Ok(Self::Lidar),
            tag => Err(ExportError::UnknownChannel { tag }),
        }
    }
}

/// One exported record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Stream the record belongs to.
    pub channel: Channel,
    /// Recording stamp of the record.
    pub stamp: Stamp,
    /// Encoded payload (see [`codec`](crate::codec)).
    pub payload: Vec<u8>,
}

impl Frame {
    /// FNV-1a over the channel tag, the little-endian stamp and the
    /// payload bytes.
    pub fn checksum(&self) -> u64 {
        let hash = fnv1a_bytes(FNV_OFFSET, &[self.channel.tag()]);
        let hash = fnv1a_bytes(hash, &self.stamp.to_le_bytes());
        fnv1a_bytes(hash, &self.payload)
    }
}
