//! Decoded sensor payloads.
//!
//! Lightweight payloads ([`GpsFix`], [`ImuSample`]) are produced by the
//! dataset loader at startup. Heavy payloads ([`PointCloud`],
//! [`PolarImage`]) are produced by a [`PayloadResolver`](crate::PayloadResolver)
//! when a worker needs them.

/// A 3-component vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vector3 {
    /// Construct from components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// An orientation quaternion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quaternion {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
    /// Scalar component.
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

/// One satellite positioning fix.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GpsFix {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in metres.
    pub altitude: f64,
    /// Row-major 3x3 position covariance.
    pub position_covariance: [f64; 9],
}

/// One inertial sample.
///
/// Older datasets only record orientation; the rate, acceleration and
/// magnetometer fields are then zero / `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImuSample {
    /// Orientation estimate.
    pub orientation: Quaternion,
    /// Angular velocity in rad/s.
    pub angular_velocity: Vector3,
    /// Linear acceleration in m/s².
    pub linear_acceleration: Vector3,
    /// Row-major 3x3 orientation covariance.
    pub orientation_covariance: [f64; 9],
    /// Row-major 3x3 angular velocity covariance.
    pub angular_velocity_covariance: [f64; 9],
    /// Row-major 3x3 linear acceleration covariance.
    pub linear_acceleration_covariance: [f64; 9],
    /// Magnetometer reading, when the dataset carries one.
    pub magnetic_field: Option<Vector3>,
}

/// A lidar return with intensity, per-point time offset and ring index.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointXyzirt {
    /// X in metres.
    pub x: f32,
    /// Y in metres.
    pub y: f32,
    /// Z in metres.
    pub z: f32,
    /// Return intensity.
    pub intensity: f32,
    /// Time offset within the sweep.
    pub t: u32,
    /// Laser ring, 1-based.
    pub ring: u16,
}

/// One lidar sweep.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointCloud {
    /// Points in file order.
    pub points: Vec<PointXyzirt>,
}

impl PointCloud {
    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the sweep has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One 8-bit grayscale polar radar frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PolarImage {
    /// Width in pixels (range bins).
    pub width: u32,
    /// Height in pixels (azimuths).
    pub height: u32,
    /// Row-major MONO8 pixels, `width * height` bytes.
    pub pixels: Vec<u8>,
}

/// A decoded value ready for emission.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// GPS fix.
    Gps(GpsFix),
    /// Inertial sample.
    Imu(ImuSample),
    /// Magnetometer reading split out of an inertial sample.
    Magnetic(Vector3),
    /// Lidar sweep.
    Lidar(PointCloud),
    /// Radar frame.
    Radar(PolarImage),
}

impl Payload {
    /// Short name of the payload variant, for logging.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Gps(_) => "gps",
            Self::Imu(_) => "imu",
            Self::Magnetic(_) => "magnetic",
            Self::Lidar(_) => "lidar",
            Self::Radar(_) => "radar",
        }
    }
}
