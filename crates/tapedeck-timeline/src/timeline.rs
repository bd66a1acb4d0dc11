//! The sorted timeline index.

use tapedeck_core::{SensorKind, Stamp};

use crate::error::TimelineError;

/// Seek positions are expressed in parts per `SEEK_SCALE` of the
/// timeline's duration (a slider with 10 000 steps).
pub const SEEK_SCALE: u32 = 10_000;

/// One `(timestamp, sensor)` record of the recorded timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimelineEntry {
    /// Recording time in nanoseconds.
    pub stamp: Stamp,
    /// Sensor that produced the record.
    pub sensor: SensorKind,
}

impl TimelineEntry {
    /// Construct an entry.
    pub const fn new(stamp: Stamp, sensor: SensorKind) -> Self {
        Self { stamp, sensor }
    }
}

/// A non-empty, ascending array of timeline entries.
///
/// Several entries may share a stamp; their relative order is the order
/// in which they were loaded. Sequential walking uses a plain index and
/// seeking uses binary search, so positions are never invalidated.
#[derive(Clone, Debug)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    /// Build from entries that must already be in ascending stamp order.
    pub fn new(entries: Vec<TimelineEntry>) -> Result<Self, TimelineError> {
        if entries.is_empty() {
            return Err(TimelineError::Empty);
        }
        if let Some(i) = entries.windows(2).position(|w| w[1].stamp < w[0].stamp) {
            return Err(TimelineError::Unsorted {
                index: i + 1,
                previous: entries[i].stamp,
                stamp: entries[i + 1].stamp,
            });
        }
        Ok(Self { entries })
    }

    /// Build from entries in any order. The sort is stable, so entries
    /// that share a stamp keep their input order.
    pub fn from_unsorted(mut entries: Vec<TimelineEntry>) -> Result<Self, TimelineError> {
        entries.sort_by_key(|e| e.stamp);
        Self::new(entries)
    }

    /// Number of entries (always at least one).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`; construction rejects empty input.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry at `index`.
    pub fn get(&self, index: usize) -> Option<&TimelineEntry> {
        self.entries.get(index)
    }

    /// All entries in order.
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// The origin that the processed offset is measured from: one
    /// nanosecond before the first entry, so the first entry becomes due
    /// as soon as the clock moves.
    pub fn initial_stamp(&self) -> Stamp {
        self.entries[0].stamp - 1
    }

    /// One nanosecond before the last entry, mirroring [`initial_stamp`](Self::initial_stamp).
    pub fn last_stamp(&self) -> Stamp {
        self.entries[self.entries.len() - 1].stamp - 1
    }

    /// Playback span in nanoseconds (`last_stamp - initial_stamp`).
    pub fn duration(&self) -> i64 {
        self.last_stamp() - self.initial_stamp()
    }

    /// Convert an absolute stamp into an offset relative to [`initial_stamp`](Self::initial_stamp).
    pub fn relative(&self, stamp: Stamp) -> i64 {
        stamp - self.initial_stamp()
    }

    /// Index of the last entry stamped at or before `stamp`, or `0` when
    /// every entry is later.
    pub fn position_at_or_before(&self, stamp: Stamp) -> usize {
        self.entries
            .partition_point(|e| e.stamp <= stamp)
            .saturating_sub(1)
    }

    /// Index of the first entry stamped strictly after `stamp`, or
    /// `len()` when there is none.
    pub fn first_after(&self, stamp: Stamp) -> usize {
        self.entries.partition_point(|e| e.stamp <= stamp)
    }

    /// The processed offset a seek to `position` (in `1..SEEK_SCALE`)
    /// targets, or `None` when `position` is out of range.
    pub fn seek_offset(&self, position: u32) -> Option<i64> {
        if position == 0 || position >= SEEK_SCALE {
            return None;
        }
        let scaled = self.duration() as i128 * position as i128 / SEEK_SCALE as i128;
        Some(scaled as i64)
    }

    /// Entry counts per sensor, indexed by [`SensorKind::index`].
    pub fn counts_by_sensor(&self) -> [usize; 4] {
        let mut counts = [0usize; 4];
        for e in &self.entries {
            counts[e.sensor.index()] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SensorKind::*;

    fn timeline(stamps: &[(i64, SensorKind)]) -> Timeline {
        Timeline::new(
            stamps
                .iter()
                .map(|&(s, k)| TimelineEntry::new(s, k))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn empty_is_rejected() {
        assert_eq!(Timeline::new(vec![]).unwrap_err(), TimelineError::Empty);
    }

    #[test]
    fn unsorted_is_rejected_with_position() {
        let err = Timeline::new(vec![
            TimelineEntry::new(10, Gps),
            TimelineEntry::new(30, Imu),
            TimelineEntry::new(20, Gps),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            TimelineError::Unsorted {
                index: 2,
                previous: 30,
                stamp: 20
            }
        );
    }

    #[test]
    fn from_unsorted_is_stable() {
        let t = Timeline::from_unsorted(vec![
            TimelineEntry::new(20, Lidar),
            TimelineEntry::new(10, Gps),
            TimelineEntry::new(20, Imu),
        ])
        .unwrap();
        let sensors: Vec<_> = t.entries().iter().map(|e| e.sensor).collect();
        assert_eq!(sensors, vec![Gps, Lidar, Imu]);
    }

    #[test]
    fn stamps_are_relative_to_one_before_first() {
        let t = timeline(&[(100, Gps), (200, Imu), (300, Gps)]);
        assert_eq!(t.initial_stamp(), 99);
        assert_eq!(t.last_stamp(), 299);
        assert_eq!(t.duration(), 200);
        assert_eq!(t.relative(250), 151);
    }

    #[test]
    fn position_at_or_before() {
        let t = timeline(&[(100, Gps), (200, Imu), (200, Gps), (300, Gps)]);
        assert_eq!(t.position_at_or_before(50), 0);
        assert_eq!(t.position_at_or_before(100), 0);
        assert_eq!(t.position_at_or_before(199), 0);
        // Duplicate stamps: the last of the run.
        assert_eq!(t.position_at_or_before(200), 2);
        assert_eq!(t.position_at_or_before(10_000), 3);
    }

    #[test]
    fn first_after() {
        let t = timeline(&[(100, Gps), (200, Imu), (200, Gps), (300, Gps)]);
        assert_eq!(t.first_after(99), 0);
        assert_eq!(t.first_after(200), 3);
        assert_eq!(t.first_after(300), 4);
    }

    #[test]
    fn seek_offset_bounds() {
        let t = timeline(&[(1_000, Gps), (11_000, Gps)]);
        assert_eq!(t.seek_offset(0), None);
        assert_eq!(t.seek_offset(SEEK_SCALE), None);
        assert_eq!(t.seek_offset(5_000), Some(5_000));
        assert_eq!(t.seek_offset(1), Some(1));
    }

    #[test]
    fn seek_offset_does_not_overflow_on_long_recordings() {
        let t = timeline(&[(0, Gps), (i64::MAX / 2, Gps)]);
        let off = t.seek_offset(9_999).unwrap();
        assert!(off > 0 && off < t.duration());
    }

    #[test]
    fn counts() {
        let t = timeline(&[(1, Gps), (2, Imu), (3, Imu), (4, Radar)]);
        assert_eq!(t.counts_by_sensor(), [1, 2, 0, 1]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn position_at_or_before_is_the_last_entry_not_after_target(
                mut stamps in proptest::collection::vec(0i64..10_000, 1..64),
                target in 0i64..10_000,
            ) {
                stamps.sort_unstable();
                let t = timeline(&stamps.iter().map(|&s| (s, Gps)).collect::<Vec<_>>());
                let pos = t.position_at_or_before(target);
                let entry = t.get(pos).unwrap();
                if stamps[0] <= target {
                    prop_assert!(entry.stamp <= target);
                    if let Some(next) = t.get(pos + 1) {
                        prop_assert!(next.stamp > target);
                    }
                } else {
                    prop_assert_eq!(pos, 0);
                }
            }

            #[test]
            fn seek_offset_stays_within_duration(
                first in 0i64..1_000_000,
                span in 1i64..1_000_000_000,
                position in 1u32..SEEK_SCALE,
            ) {
                let t = timeline(&[(first, Gps), (first + span, Gps)]);
                let off = t.seek_offset(position).unwrap();
                prop_assert!(off >= 0);
                prop_assert!(off < t.duration());
            }
        }
    }
}
