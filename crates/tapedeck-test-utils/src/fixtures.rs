//! Reusable timeline and payload fixtures.
//!
//! Payload builders derive every field from a seed so tests can tell
//! records apart by value, and a cached payload can be compared against
//! a freshly built one.

use std::collections::HashMap;

use tapedeck_core::{
    GpsFix, ImuSample, Payload, PointCloud, PointXyzirt, PolarImage, SensorKind, Stamp, Vector3,
};
use tapedeck_timeline::{FileList, StopRegion, StopRegions, Timeline, TimelineEntry};

use crate::MapResolver;

/// Build a timeline from `(stamp, sensor)` pairs in any order.
pub fn timeline(entries: &[(Stamp, SensorKind)]) -> Timeline {
    Timeline::from_unsorted(
        entries
            .iter()
            .map(|&(s, k)| TimelineEntry::new(s, k))
            .collect(),
    )
    .expect("fixture timeline must be non-empty")
}

/// Build stop regions from `(start, end)` pairs.
pub fn stops(regions: &[(Stamp, Stamp)]) -> StopRegions {
    StopRegions::new(
        regions
            .iter()
            .map(|&(a, b)| StopRegion::new(a, b))
            .collect(),
    )
    .expect("fixture stop regions must be valid")
}

/// Interleave `count` entries per sensor, `step` ns apart, starting at
/// `first`. Sensor `k` of `sensors` is offset by `k` ns so every stamp
/// is distinct.
pub fn interleaved(sensors: &[SensorKind], first: Stamp, step: i64, count: usize) -> Timeline {
    let mut entries = Vec::with_capacity(sensors.len() * count);
    for i in 0..count as i64 {
        for (k, &sensor) in sensors.iter().enumerate() {
            entries.push((first + i * step + k as i64, sensor));
        }
    }
    timeline(&entries)
}

pub fn gps_fix(seed: i64) -> Payload {
    let s = seed as f64;
    Payload::Gps(GpsFix {
        latitude: 37.0 + s * 1e-6,
        longitude: 127.0 + s * 1e-6,
        altitude: s,
        position_covariance: [s; 9],
    })
}

pub fn imu_sample(seed: i64, with_magnetometer: bool) -> Payload {
    let s = seed as f64;
    Payload::Imu(ImuSample {
        angular_velocity: Vector3::new(s, 0.0, 0.0),
        linear_acceleration: Vector3::new(0.0, 0.0, 9.81),
        magnetic_field: with_magnetometer.then(|| Vector3::new(s, s, s)),
        ..ImuSample::default()
    })
}

pub fn point_cloud(seed: i64, points: usize) -> Payload {
    Payload::Lidar(PointCloud {
        points: (0..points)
            .map(|k| PointXyzirt {
                x: seed as f32,
                y: k as f32,
                z: 0.5,
                intensity: (seed % 255) as f32,
                t: 0,
                ring: (k % 64 + 1) as u16,
            })
            .collect(),
    })
}

pub fn polar_image(seed: i64) -> Payload {
    Payload::Radar(PolarImage {
        width: 4,
        height: 2,
        pixels: (0..8).map(|k| (seed as u8).wrapping_add(k)).collect(),
    })
}

/// Timestamp-keyed GPS records for every GPS entry of `timeline`.
pub fn gps_records(timeline: &Timeline) -> HashMap<Stamp, Payload> {
    records_for(timeline, SensorKind::Gps, gps_fix)
}

/// Timestamp-keyed IMU records (no magnetometer) for every IMU entry.
pub fn imu_records(timeline: &Timeline) -> HashMap<Stamp, Payload> {
    records_for(timeline, SensorKind::Imu, |s| imu_sample(s, false))
}

fn records_for(
    timeline: &Timeline,
    sensor: SensorKind,
    build: impl Fn(Stamp) -> Payload,
) -> HashMap<Stamp, Payload> {
    timeline
        .entries()
        .iter()
        .filter(|e| e.sensor == sensor)
        .map(|e| (e.stamp, build(e.stamp)))
        .collect()
}

/// A file list and in-memory resolver covering every `sensor` entry of
/// `timeline`. Lidar gets `.bin` point clouds, radar `.png` images.
pub fn heavy_feed(timeline: &Timeline, sensor: SensorKind) -> (FileList, MapResolver) {
    let radar = sensor == SensorKind::Radar;
    let mut resolver = MapResolver::new(if radar { "png" } else { "bin" });
    for e in timeline.entries().iter().filter(|e| e.sensor == sensor) {
        let payload = if radar {
            polar_image(e.stamp)
        } else {
            point_cloud(e.stamp, 16)
        };
        resolver.insert(e.stamp, payload);
    }
    let files = FileList::new(resolver.identifiers());
    (files, resolver)
}
