//! Binary encode/decode for the export format.
//!
//! All integers and floats are little-endian. Strings are length-prefixed
//! with a `u32` length. No compression, no alignment padding.

use std::io::{self, Read, Write};

use tapedeck_core::{ImuSample, PointCloud, PointXyzirt, Quaternion, Stamp, Vector3};

use crate::error::ExportError;
use crate::types::{Channel, Frame};
use crate::{FORMAT_VERSION, MAGIC};

/// Encoded size of one lidar point: four `f32`, a `u32` and a `u16`.
pub const POINT_BYTES: usize = 22;

/// Largest frame payload written or accepted. Far above a full
/// 128-beam scan, so a larger length prefix means a corrupt file.
pub const MAX_FRAME_BYTES: usize = 64 << 20;

/// Largest header source string written or accepted.
pub const MAX_SOURCE_BYTES: usize = 64 << 10;

// ── Primitive writers ───────────────────────────────────────────

/// Write a single byte.
pub fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), ExportError> {
    w.write_all(&[v])?;
    Ok(())
}

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), ExportError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u64.
pub fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), ExportError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian i64.
pub fn write_i64_le(w: &mut dyn Write, v: i64) -> Result<(), ExportError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a length-prefixed UTF-8 string (u32 length + bytes).
pub fn write_length_prefixed_str(w: &mut dyn Write, s: &str) -> Result<(), ExportError> {
    write_u32_le(w, checked_len(s.len(), MAX_SOURCE_BYTES)?)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

fn checked_len(len: usize, limit: usize) -> Result<u32, ExportError> {
    match u32::try_from(len) {
        Ok(prefix) if len <= limit => Ok(prefix),
        _ => Err(ExportError::PayloadTooLarge { len, limit }),
    }
}

// ── Primitive readers ───────────────────────────────────────────

/// Read a single byte.
pub fn read_u8(r: &mut dyn Read) -> Result<u8, ExportError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, ExportError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a little-endian u64.
pub fn read_u64_le(r: &mut dyn Read) -> Result<u64, ExportError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read a little-endian i64.
pub fn read_i64_le(r: &mut dyn Read) -> Result<i64, ExportError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

/// Read a `u32` length prefix, rejecting it before anything is
/// allocated if it exceeds `limit`.
pub fn read_len(r: &mut dyn Read, limit: usize) -> Result<usize, ExportError> {
    let len = read_u32_le(r)? as usize;
    if len > limit {
        return Err(ExportError::PayloadTooLarge { len, limit });
    }
    Ok(len)
}

/// Read a length-prefixed UTF-8 string.
pub fn read_length_prefixed_str(r: &mut dyn Read) -> Result<String, ExportError> {
    let len = read_len(r, MAX_SOURCE_BYTES)?;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| ExportError::MalformedFrame {
        detail: format!("invalid UTF-8 string: {e}"),
    })
}

// ── Header encode/decode ────────────────────────────────────────

/// Encode the file header: magic, version, and the source description.
pub fn encode_header(w: &mut dyn Write, source: &str) -> Result<(), ExportError> {
    w.write_all(&MAGIC)?;
    write_u8(w, FORMAT_VERSION)?;
    write_length_prefixed_str(w, source)
}

/// Decode and validate the file header, returning the source description.
pub fn decode_header(r: &mut dyn Read) -> Result<String, ExportError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(ExportError::InvalidMagic);
    }
    let version = read_u8(r)?;
    if version != FORMAT_VERSION {
        return Err(ExportError::UnsupportedVersion { found: version });
    }
    read_length_prefixed_str(r)
}

// ── Frame encode/decode ─────────────────────────────────────────

/// Encode a single frame, appending its checksum.
pub fn encode_frame(w: &mut dyn Write, frame: &Frame) -> Result<(), ExportError> {
    let len = checked_len(frame.payload.len(), MAX_FRAME_BYTES)?;
    write_u8(w, frame.channel.tag())?;
    write_i64_le(w, frame.stamp)?;
    write_u32_le(w, len)?;
    w.write_all(&frame.payload)?;
    write_u64_le(w, frame.checksum())
}

/// Decode a single frame and verify its checksum.
///
/// Returns `Ok(None)` on clean EOF (no bytes available), `Ok(Some(frame))`
/// on success, or an error on truncated, corrupt or unverifiable data.
pub fn decode_frame(r: &mut dyn Read) -> Result<Option<Frame>, ExportError> {
    // The channel byte is read on its own so that a clean EOF between
    // frames is distinguishable from truncation inside one.
    let mut tag = [0u8; 1];
    loop {
        match r.read(&mut tag) {
            Ok(0) => return Ok(None),
            Ok(_) => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ExportError::Io(e)),
        }
    }
    let channel = Channel::try_from(tag[0])?;

    let (stamp, payload, recorded) = read_frame_body(r).map_err(truncated)?;

    let frame = Frame {
        channel,
        stamp,
        payload,
    };
    let computed = frame.checksum();
    if computed != recorded {
        return Err(ExportError::ChecksumMismatch {
            stamp,
            recorded,
            computed,
        });
    }
    Ok(Some(frame))
}

fn read_frame_body(r: &mut dyn Read) -> Result<(Stamp, Vec<u8>, u64), ExportError> {
    let stamp = read_i64_le(r)?;
    let len = read_len(r, MAX_FRAME_BYTES)?;
    let mut payload = vec![0u8; len];
    r.read_exact(&mut payload)?;
    let recorded = read_u64_le(r)?;
    Ok((stamp, payload, recorded))
}

fn truncated(e: ExportError) -> ExportError {
    match e {
        ExportError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            ExportError::MalformedFrame {
                detail: "truncated frame".into(),
            }
        }
        other => other,
    }
}

// ── Payload encode/decode ───────────────────────────────────────

fn put_f64s(buf: &mut Vec<u8>, vs: &[f64]) {
    for v in vs {
        buf.extend_from_slice(&v.to_le_bytes());
    }
}

fn put_vec3(buf: &mut Vec<u8>, v: &Vector3) {
    put_f64s(buf, &[v.x, v.y, v.z]);
}

/// Encode an IMU sample: orientation, angular velocity, linear
/// acceleration, the three covariances, then a presence byte and the
/// magnetometer triple.
pub fn encode_imu(sample: &ImuSample) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 * 38 + 1);
    let q = &sample.orientation;
    put_f64s(&mut buf, &[q.x, q.y, q.z, q.w]);
    put_vec3(&mut buf, &sample.angular_velocity);
    put_vec3(&mut buf, &sample.linear_acceleration);
    put_f64s(&mut buf, &sample.orientation_covariance);
    put_f64s(&mut buf, &sample.angular_velocity_covariance);
    put_f64s(&mut buf, &sample.linear_acceleration_covariance);
    match &sample.magnetic_field {
        Some(m) => {
            buf.push(1);
            put_vec3(&mut buf, m);
        }
        None => buf.push(0),
    }
    buf
}

/// Decode an IMU payload produced by [`encode_imu`].
pub fn decode_imu(bytes: &[u8]) -> Result<ImuSample, ExportError> {
    let mut r = bytes;
    let sample = read_imu(&mut r).map_err(truncated)?;
    expect_consumed(r, "imu")?;
    Ok(sample)
}

fn read_f64s<const N: usize>(r: &mut dyn Read) -> Result<[f64; N], ExportError> {
    let mut out = [0.0; N];
    for v in &mut out {
        *v = f64::from_bits(read_u64_le(r)?);
    }
    Ok(out)
}

fn read_vec3(r: &mut dyn Read) -> Result<Vector3, ExportError> {
    let [x, y, z] = read_f64s(r)?;
    Ok(Vector3::new(x, y, z))
}

fn read_imu(r: &mut dyn Read) -> Result<ImuSample, ExportError> {
    let [x, y, z, w] = read_f64s(r)?;
    let angular_velocity = read_vec3(r)?;
    let linear_acceleration = read_vec3(r)?;
    let orientation_covariance = read_f64s(r)?;
    let angular_velocity_covariance = read_f64s(r)?;
    let linear_acceleration_covariance = read_f64s(r)?;
    let magnetic_field = match read_u8(r)? {
        0 => None,
        1 => Some(read_vec3(r)?),
        flag => {
            return Err(ExportError::MalformedFrame {
                detail: format!("invalid magnetometer presence flag: {flag}"),
            })
        }
    };
    Ok(ImuSample {
        orientation: Quaternion { x, y, z, w },
        angular_velocity,
        linear_acceleration,
        orientation_covariance,
        angular_velocity_covariance,
        linear_acceleration_covariance,
        magnetic_field,
    })
}

/// Encode a point cloud: a `u32` point count, then each point as
/// `x, y, z, intensity: f32`, `t: u32`, `ring: u16`.
pub fn encode_cloud(cloud: &PointCloud) -> Result<Vec<u8>, ExportError> {
    let count = checked_len(cloud.len(), MAX_FRAME_BYTES / POINT_BYTES)?;
    let mut buf = Vec::with_capacity(4 + cloud.len() * POINT_BYTES);
    buf.extend_from_slice(&count.to_le_bytes());
    for p in &cloud.points {
        for v in [p.x, p.y, p.z, p.intensity] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf.extend_from_slice(&p.t.to_le_bytes());
        buf.extend_from_slice(&p.ring.to_le_bytes());
    }
    Ok(buf)
}

/// Decode a point-cloud payload produced by [`encode_cloud`].
pub fn decode_cloud(bytes: &[u8]) -> Result<PointCloud, ExportError> {
    let Some((count, body)) = bytes.split_first_chunk::<4>() else {
        return Err(ExportError::MalformedFrame {
            detail: "truncated point count".into(),
        });
    };
    let count = u32::from_le_bytes(*count) as usize;
    if body.len() != count * POINT_BYTES {
        return Err(ExportError::MalformedFrame {
            detail: format!(
                "point cloud declares {count} points but carries {} bytes",
                body.len()
            ),
        });
    }
    let f32_at = |p: &[u8], at: usize| f32::from_le_bytes([p[at], p[at + 1], p[at + 2], p[at + 3]]);
    let points = body
        .chunks_exact(POINT_BYTES)
        .map(|p| PointXyzirt {
            x: f32_at(p, 0),
            y: f32_at(p, 4),
            z: f32_at(p, 8),
            intensity: f32_at(p, 12),
            t: u32::from_le_bytes([p[16], p[17], p[18], p[19]]),
            ring: u16::from_le_bytes([p[20], p[21]]),
        })
        .collect();
    Ok(PointCloud { points })
}

fn expect_consumed(rest: &[u8], what: &str) -> Result<(), ExportError> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(ExportError::MalformedFrame {
            detail: format!("{} trailing bytes after {what} payload", rest.len()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(with_mag: bool) -> ImuSample {
        ImuSample {
            orientation: Quaternion {
                x: 0.1,
                y: -0.2,
                z: 0.3,
                w: 0.9,
            },
            angular_velocity: Vector3::new(1.0, 2.0, 3.0),
            linear_acceleration: Vector3::new(0.0, 0.0, 9.81),
            orientation_covariance: [3.0, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 3.0],
            magnetic_field: with_mag.then(|| Vector3::new(0.2, 0.0, -0.4)),
            ..ImuSample::default()
        }
    }

    #[test]
    fn header_is_validated() {
        let mut buf = Vec::new();
        encode_header(&mut buf, "/data/run1").unwrap();
        assert_eq!(&buf[..4], b"TDCK");
        assert_eq!(decode_header(&mut buf.as_slice()).unwrap(), "/data/run1");

        let mut bad = buf.clone();
        bad[4] = FORMAT_VERSION + 1;
        assert!(matches!(
            decode_header(&mut bad.as_slice()),
            Err(ExportError::UnsupportedVersion { .. })
        ));
        bad[0] = b'X';
        assert!(matches!(
            decode_header(&mut bad.as_slice()),
            Err(ExportError::InvalidMagic)
        ));
    }

    #[test]
    fn frame_layout_is_fixed() {
        let frame = Frame {
            channel: Channel::Lidar,
            stamp: 0x0102,
            payload: vec![9, 8],
        };
        let mut buf = Vec::new();
        encode_frame(&mut buf, &frame).unwrap();
        assert_eq!(buf.len(), 1 + 8 + 4 + 2 + 8);
        assert_eq!(buf[0], 2);
        assert_eq!(&buf[1..9], &0x0102i64.to_le_bytes());
        assert_eq!(&buf[9..13], &2u32.to_le_bytes());
        assert_eq!(&buf[13..15], &[9, 8]);
        assert_eq!(&buf[15..], &frame.checksum().to_le_bytes());
    }

    #[test]
    fn clean_eof_is_none() {
        assert!(decode_frame(&mut [].as_slice()).unwrap().is_none());
    }

    #[test]
    fn corrupted_payload_fails_checksum() {
        let frame = Frame {
            channel: Channel::Imu,
            stamp: 5,
            payload: vec![1, 2, 3, 4],
        };
        let mut buf = Vec::new();
        encode_frame(&mut buf, &frame).unwrap();
        buf[14] ^= 0xff;
        assert!(matches!(
            decode_frame(&mut buf.as_slice()),
            Err(ExportError::ChecksumMismatch { stamp: 5, .. })
        ));
    }

    #[test]
    fn truncated_frame_is_malformed() {
        let frame = Frame {
            channel: Channel::Imu,
            stamp: 5,
            payload: vec![1, 2, 3, 4],
        };
        let mut buf = Vec::new();
        encode_frame(&mut buf, &frame).unwrap();
        buf.truncate(buf.len() - 3);
        assert!(matches!(
            decode_frame(&mut buf.as_slice()),
            Err(ExportError::MalformedFrame { .. })
        ));
    }

    #[test]
    fn oversized_length_prefix_is_rejected_before_reading() {
        // A corrupt prefix claiming a 4 GiB payload, with no payload behind it.
        let mut buf = vec![Channel::Lidar.tag()];
        buf.extend_from_slice(&7i64.to_le_bytes());
        buf.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            decode_frame(&mut buf.as_slice()),
            Err(ExportError::PayloadTooLarge { limit: MAX_FRAME_BYTES, .. })
        ));

        let mut header = MAGIC.to_vec();
        header.push(FORMAT_VERSION);
        header.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            decode_header(&mut header.as_slice()),
            Err(ExportError::PayloadTooLarge { limit: MAX_SOURCE_BYTES, .. })
        ));
    }

    #[test]
    fn oversized_source_is_not_written() {
        let source = "x".repeat(MAX_SOURCE_BYTES + 1);
        let mut buf = Vec::new();
        assert!(matches!(
            encode_header(&mut buf, &source),
            Err(ExportError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn imu_payload_preserves_magnetometer_presence() {
        for with_mag in [false, true] {
            let s = sample(with_mag);
            assert_eq!(decode_imu(&encode_imu(&s)).unwrap(), s);
        }
        let mut bytes = encode_imu(&sample(false));
        bytes.push(0);
        assert!(decode_imu(&bytes).is_err());
        assert!(decode_imu(&bytes[..20]).is_err());
    }

    #[test]
    fn cloud_length_must_match_count() {
        let cloud = PointCloud {
            points: vec![
                PointXyzirt {
                    x: 1.0,
                    ring: 1,
                    ..Default::default()
                },
                PointXyzirt {
                    z: -1.0,
                    t: 7,
                    ring: 2,
                    ..Default::default()
                },
            ],
        };
        let bytes = encode_cloud(&cloud).unwrap();
        assert_eq!(bytes.len(), 4 + 2 * POINT_BYTES);
        assert_eq!(decode_cloud(&bytes).unwrap(), cloud);
        assert!(decode_cloud(&bytes[..bytes.len() - 1]).is_err());
        assert!(decode_cloud(&bytes[..2]).is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn any_frame_survives_encoding(
                lidar in any::<bool>(),
                stamp in any::<i64>(),
                payload in proptest::collection::vec(any::<u8>(), 0..256),
            ) {
                let frame = Frame {
                    channel: if lidar { Channel::Lidar } else { Channel::Imu },
                    stamp,
                    payload,
                };
                let mut buf = Vec::new();
                encode_frame(&mut buf, &frame).unwrap();
                let mut r = buf.as_slice();
                prop_assert_eq!(decode_frame(&mut r).unwrap(), Some(frame));
                prop_assert!(r.is_empty());
            }
        }
    }
}
