//! FNV-1a digests of decoded payloads.
//!
//! Used to check that two decodes of the same record are bit-identical
//! (prefetched vs. direct loads) and to checksum exported records.
//! Not cryptographically secure.

use crate::payload::{Payload, Vector3};

/// FNV-1a offset basis for 64-bit.
pub const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

/// Feed a byte slice into an FNV-1a hash state.
#[inline]
pub fn fnv1a_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash = (hash ^ b as u64).wrapping_mul(FNV_PRIME);
    }
    hash
}

#[inline]
fn fnv1a_f64(hash: u64, v: f64) -> u64 {
    fnv1a_bytes(hash, &v.to_bits().to_le_bytes())
}

#[inline]
fn fnv1a_f32(hash: u64, v: f32) -> u64 {
    fnv1a_bytes(hash, &v.to_bits().to_le_bytes())
}

fn fnv1a_vec3(hash: u64, v: &Vector3) -> u64 {
    let hash = fnv1a_f64(hash, v.x);
    let hash = fnv1a_f64(hash, v.y);
    fnv1a_f64(hash, v.z)
}

fn fnv1a_f64s(hash: u64, vs: &[f64]) -> u64 {
    vs.iter().fold(hash, |h, &v| fnv1a_f64(h, v))
}

/// Compute a digest over every bit of a payload.
///
/// The variant is folded in first so that payloads of different kinds
/// with coincidentally equal bytes never collide trivially. Floats are
/// hashed by bit pattern, so `-0.0` and `0.0` differ and NaNs compare by
/// payload bits.
pub fn payload_digest(payload: &Payload) -> u64 {
    let hash = fnv1a_bytes(FNV_OFFSET, payload.kind_name().as_bytes());
    match payload {
        Payload::Gps(fix) => {
            let hash = fnv1a_f64s(hash, &[fix.latitude, fix.longitude, fix.altitude]);
            fnv1a_f64s(hash, &fix.position_covariance)
        }
        Payload::Imu(s) => {
            let q = &s.orientation;
            let mut hash = fnv1a_f64s(hash, &[q.x, q.y, q.z, q.w]);
            hash = fnv1a_vec3(hash, &s.angular_velocity);
            hash = fnv1a_vec3(hash, &s.linear_acceleration);
            hash = fnv1a_f64s(hash, &s.orientation_covariance);
            hash = fnv1a_f64s(hash, &s.angular_velocity_covariance);
            hash = fnv1a_f64s(hash, &s.linear_acceleration_covariance);
            match &s.magnetic_field {
                Some(m) => fnv1a_vec3(fnv1a_bytes(hash, &[1]), m),
                None => fnv1a_bytes(hash, &[0]),
            }
        }
        Payload::Magnetic(m) => fnv1a_vec3(hash, m),
        Payload::Lidar(cloud) => {
            let mut hash = fnv1a_bytes(hash, &(cloud.points.len() as u64).to_le_bytes());
            for p in &cloud.points {
                hash = fnv1a_f32(hash, p.x);
                hash = fnv1a_f32(hash, p.y);
                hash = fnv1a_f32(hash, p.z);
                hash = fnv1a_f32(hash, p.intensity);
                hash = fnv1a_bytes(hash, &p.t.to_le_bytes());
                hash = fnv1a_bytes(hash, &p.ring.to_le_bytes());
            }
            hash
        }
        Payload::Radar(img) => {
            let hash = fnv1a_bytes(hash, &img.width.to_le_bytes());
            let hash = fnv1a_bytes(hash, &img.height.to_le_bytes());
            fnv1a_bytes(hash, &img.pixels)
        }
    }
}
