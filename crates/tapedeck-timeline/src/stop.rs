//! Stop regions: recorded intervals where the vehicle was stationary.

use tapedeck_core::Stamp;

use crate::error::TimelineError;

/// A closed `[start, end]` interval of recording time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StopRegion {
    /// First stamp of the interval.
    pub start: Stamp,
    /// Last stamp of the interval.
    pub end: Stamp,
}

impl StopRegion {
    /// Construct a region. Validation happens in [`StopRegions::new`].
    pub const fn new(start: Stamp, end: Stamp) -> Self {
        Self { start, end }
    }

    /// Whether `stamp` lies inside the closed interval.
    pub fn contains(&self, stamp: Stamp) -> bool {
        self.start <= stamp && stamp <= self.end
    }
}

/// Disjoint stop regions in ascending order.
#[derive(Clone, Debug, Default)]
pub struct StopRegions {
    regions: Vec<StopRegion>,
}

impl StopRegions {
    /// No stop regions.
    pub fn none() -> Self {
        Self::default()
    }

    /// Sort and validate a set of regions.
    ///
    /// Rejects regions whose end precedes their start, and any pair of
    /// regions that share a stamp.
    pub fn new(mut regions: Vec<StopRegion>) -> Result<Self, TimelineError> {
        if let Some(r) = regions.iter().find(|r| r.end < r.start) {
            return Err(TimelineError::InvertedStopRegion {
                start: r.start,
                end: r.end,
            });
        }
        regions.sort_by_key(|r| r.start);
        if let Some(w) = regions.windows(2).find(|w| w[1].start <= w[0].end) {
            return Err(TimelineError::OverlappingStopRegions {
                first: w[0],
                second: w[1],
            });
        }
        Ok(Self { regions })
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether there are no regions.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// The region at `index`.
    pub fn get(&self, index: usize) -> Option<&StopRegion> {
        self.regions.get(index)
    }

    /// All regions in order.
    pub fn iter(&self) -> impl Iterator<Item = &StopRegion> {
        self.regions.iter()
    }

    /// Index of the first region starting at or after `stamp`, or
    /// `len()` when there is none.
    pub fn first_at_or_after(&self, stamp: Stamp) -> usize {
        self.regions.partition_point(|r| r.start < stamp)
    }

    /// The region containing `stamp`, if any.
    pub fn containing(&self, stamp: Stamp) -> Option<&StopRegion> {
        let idx = self.regions.partition_point(|r| r.start <= stamp);
        idx.checked_sub(1)
            .map(|i| &self.regions[i])
            .filter(|r| r.contains(stamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions_are_sorted_on_construction() {
        let regions =
            StopRegions::new(vec![StopRegion::new(500, 600), StopRegion::new(100, 200)]).unwrap();
        assert_eq!(regions.get(0), Some(&StopRegion::new(100, 200)));
        assert_eq!(regions.len(), 2);
    }

    #[test]
    fn inverted_region_is_rejected() {
        let err = StopRegions::new(vec![StopRegion::new(10, 5)]).unwrap_err();
        assert_eq!(err, TimelineError::InvertedStopRegion { start: 10, end: 5 });
    }

    #[test]
    fn overlap_is_rejected() {
        let err = StopRegions::new(vec![StopRegion::new(100, 200), StopRegion::new(200, 300)])
            .unwrap_err();
        assert!(matches!(err, TimelineError::OverlappingStopRegions { .. }));
    }

    #[test]
    fn first_at_or_after() {
        let regions = StopRegions::new(vec![
            StopRegion::new(100, 200),
            StopRegion::new(300, 400),
        ])
        .unwrap();
        assert_eq!(regions.first_at_or_after(0), 0);
        assert_eq!(regions.first_at_or_after(100), 0);
        assert_eq!(regions.first_at_or_after(101), 1);
        assert_eq!(regions.first_at_or_after(300), 1);
        assert_eq!(regions.first_at_or_after(301), 2);
    }

    #[test]
    fn containing() {
        let regions = StopRegions::new(vec![
            StopRegion::new(100, 200),
            StopRegion::new(300, 400),
        ])
        .unwrap();
        assert_eq!(regions.containing(99), None);
        assert_eq!(regions.containing(100), Some(&StopRegion::new(100, 200)));
        assert_eq!(regions.containing(200), Some(&StopRegion::new(100, 200)));
        assert_eq!(regions.containing(250), None);
        assert_eq!(regions.containing(400), Some(&StopRegion::new(300, 400)));
        assert!(StopRegions::none().containing(0).is_none());
    }
}
