//! Decoders for the heavy-sensor file formats.

use image::ImageFormat;
use tapedeck_core::{PointCloud, PointXyzirt, PolarImage};

/// Bytes per lidar point: four little-endian `f32` (x, y, z, intensity).
pub const POINT_STRIDE: usize = 16;

/// Beams of the recording lidar; points are assigned rings cyclically.
const LIDAR_RINGS: usize = 64;

/// Decode a raw lidar scan.
///
/// Each 16-byte record becomes one point; point `k` lies on ring
/// `k % 64 + 1`. A trailing partial record is ignored.
pub fn decode_point_cloud(bytes: &[u8]) -> PointCloud {
    let chunks = bytes.chunks_exact(POINT_STRIDE);
    if !chunks.remainder().is_empty() {
        tracing::debug!(
            trailing = chunks.remainder().len(),
            "ignoring partial lidar record"
        );
    }
    let points = chunks
        .enumerate()
        .map(|(k, rec)| PointXyzirt {
            x: f32_at(rec, 0),
            y: f32_at(rec, 4),
            z: f32_at(rec, 8),
            intensity: f32_at(rec, 12),
            t: 0,
            ring: (k % LIDAR_RINGS + 1) as u16,
        })
        .collect();
    PointCloud { points }
}

fn f32_at(rec: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([rec[at], rec[at + 1], rec[at + 2], rec[at + 3]])
}

/// Decode a polar radar frame to 8-bit grayscale, whatever the PNG's
/// own colour type.
pub fn decode_polar_image(bytes: &[u8]) -> Result<PolarImage, image::ImageError> {
    let gray = image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_luma8();
    let (width, height) = gray.dimensions();
    Ok(PolarImage {
        width,
        height,
        pixels: gray.into_raw(),
    })
}
