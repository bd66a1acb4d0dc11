//! Sensor kinds and compact sensor sets.

use std::fmt;
use std::str::FromStr;

/// The kind of sensor a timeline entry belongs to.
///
/// GPS and IMU are lightweight: their records are parsed up front and
/// kept in memory. Lidar and radar are heavy: each record is a file that
/// must be decoded on demand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SensorKind {
    /// Satellite positioning fixes.
    Gps,
    /// Inertial measurement samples (optionally with magnetometer).
    Imu,
    /// Rotating lidar point clouds.
    Lidar,
    /// Polar imaging-radar frames.
    Radar,
}

impl SensorKind {
    /// Every sensor kind, in dispatch-table order.
    pub const ALL: [SensorKind; 4] = [Self::Gps, Self::Imu, Self::Lidar, Self::Radar];

    /// The tag used for this sensor in `data_stamp.csv`.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Gps => "gps",
            Self::Imu => "imu",
            Self::Lidar => "ouster",
            Self::Radar => "radar",
        }
    }

    /// Dense index in `0..4`, matching [`SensorKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether payloads of this kind are decoded from files on demand.
    pub fn is_heavy(self) -> bool {
        matches!(self, Self::Lidar | Self::Radar)
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A stamp tag that does not name any known sensor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownSensorTag(pub String);

impl fmt::Display for UnknownSensorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sensor tag '{}'", self.0)
    }
}

impl std::error::Error for UnknownSensorTag {}

impl FromStr for SensorKind {
    type Err = UnknownSensorTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "gps" => Ok(Self::Gps),
            "imu" => Ok(Self::Imu),
            "ouster" | "lidar" => Ok(Self::Lidar),
            "radar" => Ok(Self::Radar),
            other => Err(UnknownSensorTag(other.to_string())),
        }
    }
}

/// A set of sensor kinds, stored as a 4-bit mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct SensorSet(u8);

impl SensorSet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// All four sensor kinds.
    pub const fn all() -> Self {
        Self(0b1111)
    }

    /// Return a copy with `kind` added.
    pub fn with(self, kind: SensorKind) -> Self {
        Self(self.0 | (1 << kind.index()))
    }

    /// Return a copy with `kind` removed.
    pub fn without(self, kind: SensorKind) -> Self {
        Self(self.0 & !(1 << kind.index()))
    }

    /// Whether `kind` is a member.
    pub fn contains(self, kind: SensorKind) -> bool {
        self.0 & (1 << kind.index()) != 0
    }

    /// Whether the set has no members.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in [`SensorKind::ALL`] order.
    pub fn iter(self) -> impl Iterator<Item = SensorKind> {
        SensorKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

impl FromIterator<SensorKind> for SensorSet {
    fn from_iter<I: IntoIterator<Item = SensorKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}
