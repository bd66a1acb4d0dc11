//! Benchmark profiles for the tapedeck playback engine.
//!
//! Provides synthetic recordings shaped like a real urban drive:
//!
//! - [`reference_timeline`]: GPS at 10 Hz, IMU at 100 Hz, lidar at 10 Hz,
//!   radar at 4 Hz, for a given number of seconds
//! - [`stop_profile`]: evenly spaced stop regions over a timeline
//! - [`file_list`]: the `<stamp>.<ext>` file list of one heavy sensor
//! - [`raw_scan`]: a raw lidar scan in the on-disk point format

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tapedeck_core::{SensorKind, Stamp};
use tapedeck_timeline::{FileList, StopRegion, StopRegions, Timeline, TimelineEntry};

/// First stamp of every synthetic recording (a plausible epoch in ns).
pub const START: Stamp = 1_559_193_000_000_000_000;

const SECOND: i64 = 1_000_000_000;

/// Recording rate of each sensor, in Hz.
pub fn rate_hz(sensor: SensorKind) -> i64 {
    match sensor {
        SensorKind::Gps => 10,
        SensorKind::Imu => 100,
        SensorKind::Lidar => 10,
        SensorKind::Radar => 4,
    }
}

/// A timeline of `seconds` of recording with every sensor at its
/// [`rate_hz`]. Each sensor is phase-shifted by a few microseconds so
/// that no two entries share a stamp.
pub fn reference_timeline(seconds: i64) -> Timeline {
    let mut entries = Vec::new();
    for (phase, sensor) in SensorKind::ALL.into_iter().enumerate() {
        let period = SECOND / rate_hz(sensor);
        let count = seconds * rate_hz(sensor);
        entries.extend(
            (0..count).map(|k| TimelineEntry::new(START + k * period + phase as i64 * 1_000, sensor)),
        );
    }
    Timeline::from_unsorted(entries).expect("synthetic timeline is non-empty")
}

/// `count` stop regions of `length_ns` each, spread evenly over
/// `timeline`.
pub fn stop_profile(timeline: &Timeline, count: i64, length_ns: i64) -> StopRegions {
    let spacing = timeline.duration() / (count + 1);
    let regions = (1..=count)
        .map(|k| {
            let start = timeline.initial_stamp() + k * spacing;
            StopRegion::new(start, start + length_ns.min(spacing - 1))
        })
        .collect();
    StopRegions::new(regions).expect("synthetic stop regions are disjoint")
}

/// File names for every `sensor` entry of `timeline`.
pub fn file_list(timeline: &Timeline, sensor: SensorKind, extension: &str) -> FileList {
    timeline
        .entries()
        .iter()
        .filter(|e| e.sensor == sensor)
        .map(|e| format!("{}.{extension}", e.stamp))
        .collect()
}

/// A raw lidar scan of `points` records (`f32` x, y, z, intensity).
pub fn raw_scan(points: usize) -> Vec<u8> {
    (0..points)
        .flat_map(|k| {
            let a = k as f32 * 0.01;
            [a.cos() * 20.0, a.sin() * 20.0, (k % 64) as f32 * 0.1, 0.5]
        })
        .flat_map(f32::to_le_bytes)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_timeline_has_every_sensor_at_its_rate() {
        let t = reference_timeline(10);
        assert_eq!(t.counts_by_sensor(), [100, 1000, 100, 40]);
        assert_eq!(t.initial_stamp(), START - 1);
    }

    #[test]
    fn stop_profile_is_valid_and_inside_the_timeline() {
        let t = reference_timeline(60);
        let stops = stop_profile(&t, 5, 2 * SECOND);
        assert_eq!(stops.len(), 5);
        for r in stops.iter() {
            assert!(r.start > t.initial_stamp() && r.end < t.last_stamp());
        }
    }

    #[test]
    fn file_list_matches_entries() {
        let t = reference_timeline(2);
        let files = file_list(&t, SensorKind::Radar, "png");
        assert_eq!(files.len(), 8);
        assert_eq!(files.stamp_of(0), Some(START + 3_000));
    }

    #[test]
    fn raw_scan_size() {
        assert_eq!(raw_scan(100).len(), 1600);
    }
}
