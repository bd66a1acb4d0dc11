//! Row parsers for the CSV inputs.
//!
//! Every parser returns `None` for a row it cannot use; the loader
//! counts those rows and moves on.

use csv::StringRecord;
use tapedeck_core::{GpsFix, ImuSample, Quaternion, Stamp, Vector3};
use tapedeck_timeline::StopRegion;

/// Diagonal covariance assigned to every axis of a full IMU row.
pub const IMU_COVARIANCE: f64 = 3.0;

/// Columns of a GPS row: stamp, latitude, longitude, altitude, and a
/// row-major 3x3 position covariance.
pub const GPS_COLUMNS: usize = 13;

/// Columns of an orientation-only IMU row: stamp, quaternion (x, y, z,
/// w), Euler angles (ignored).
pub const IMU_SHORT_COLUMNS: usize = 8;

/// Columns of a full IMU row: the short row plus gyro, accelerometer and
/// magnetometer triples.
pub const IMU_FULL_COLUMNS: usize = 17;

fn floats<const N: usize>(row: &StringRecord, from: usize) -> Option<[f64; N]> {
    let mut out = [0.0; N];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = row.get(from + i)?.trim().parse().ok()?;
    }
    Some(out)
}

fn stamp(row: &StringRecord) -> Option<Stamp> {
    row.get(0)?.trim().parse().ok()
}

/// `stamp,tag` from the stamp index. The tag is returned verbatim.
pub fn parse_stamp_row(row: &StringRecord) -> Option<(Stamp, &str)> {
    if row.len() < 2 {
        return None;
    }
    Some((stamp(row)?, row.get(1)?.trim()))
}

/// A GPS fix.
pub fn parse_gps_row(row: &StringRecord) -> Option<(Stamp, GpsFix)> {
    if row.len() != GPS_COLUMNS {
        return None;
    }
    let [latitude, longitude, altitude] = floats(row, 1)?;
    let position_covariance = floats(row, 4)?;
    Some((
        stamp(row)?,
        GpsFix {
            latitude,
            longitude,
            altitude,
            position_covariance,
        },
    ))
}

/// An IMU sample, from either the short or the full row shape.
pub fn parse_imu_row(row: &StringRecord) -> Option<(Stamp, ImuSample)> {
    let stamp = stamp(row)?;
    let [x, y, z, w] = floats(row, 1)?;
    let orientation = Quaternion { x, y, z, w };

    match row.len() {
        IMU_SHORT_COLUMNS => {
            // Euler angles duplicate the quaternion; validate and drop them.
            floats::<3>(row, 5)?;
            Some((
                stamp,
                ImuSample {
                    orientation,
                    ..ImuSample::default()
                },
            ))
        }
        IMU_FULL_COLUMNS => {
            let [gx, gy, gz, ax, ay, az, mx, my, mz] = floats(row, 8)?;
            let mut diag = [0.0; 9];
            diag[0] = IMU_COVARIANCE;
            diag[4] = IMU_COVARIANCE;
            diag[8] = IMU_COVARIANCE;
            Some((
                stamp,
                ImuSample {
                    orientation,
                    angular_velocity: Vector3::new(gx, gy, gz),
                    linear_acceleration: Vector3::new(ax, ay, az),
                    orientation_covariance: diag,
                    angular_velocity_covariance: diag,
                    linear_acceleration_covariance: diag,
                    magnetic_field: Some(Vector3::new(mx, my, mz)),
                },
            ))
        }
        _ => None,
    }
}

/// A `start,end` stop region. Ordering is checked later, when the full
/// set is validated.
pub fn parse_stop_row(row: &StringRecord) -> Option<StopRegion> {
    if row.len() < 2 {
        return None;
    }
    let start = row.get(0)?.trim().parse().ok()?;
    let end = row.get(1)?.trim().parse().ok()?;
    Some(StopRegion::new(start, end))
}
