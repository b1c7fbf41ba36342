use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A half-open `[start, end)` span of instants.
///
/// Two intervals overlap iff `a.start < b.end && b.start < a.end`; an
/// interval that ends exactly where another starts does not overlap it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        if start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// `other` lies fully within this interval. Inclusive on both edges of
    /// the half-open container, so an event ending exactly when a schedule
    /// window closes is still contained.
    pub fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// A set of intervals kept sorted by start and coalesced: overlapping or
/// touching members are merged, so membership tests reduce to a binary
/// search over disjoint spans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    pub fn new(mut intervals: Vec<Interval>) -> Self {
        intervals.sort_by_key(|i| i.start);

        let mut coalesced: Vec<Interval> = Vec::with_capacity(intervals.len());
        for interval in intervals {
            match coalesced.last_mut() {
                Some(last) if interval.start <= last.end => {
                    if interval.end > last.end {
                        last.end = interval.end;
                    }
                }
                _ => coalesced.push(interval),
            }
        }

        Self {
            intervals: coalesced,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn as_slice(&self) -> &[Interval] {
        &self.intervals
    }

    /// Whether some member fully contains `probe`.
    pub fn covers(&self, probe: &Interval) -> bool {
        // Last member starting at or before probe.start is the only candidate
        let idx = self.intervals.partition_point(|i| i.start <= probe.start);
        idx > 0 && self.intervals[idx - 1].contains(probe)
    }

    /// Whether any member overlaps `probe`.
    pub fn overlaps(&self, probe: &Interval) -> bool {
        let idx = self.intervals.partition_point(|i| i.end <= probe.start);
        self.intervals
            .get(idx)
            .is_some_and(|i| i.overlaps(probe))
    }

    /// Trim the set to `[start, end)`, splitting members on the boundary.
    pub fn clamp(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) {
        self.intervals.retain(|i| i.start < end && start < i.end);
        if let Some(first) = self.intervals.first_mut() {
            if first.start < start {
                first.start = start;
            }
        }
        if let Some(last) = self.intervals.last_mut() {
            if last.end > end {
                last.end = end;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(minutes: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(minutes * 60, 0).unwrap()
    }

    fn iv(start: i64, end: i64) -> Interval {
        Interval::new(ts(start), ts(end)).unwrap()
    }

    #[test]
    fn rejects_empty_intervals() {
        assert!(Interval::new(ts(10), ts(10)).is_none());
        assert!(Interval::new(ts(10), ts(5)).is_none());
    }

    #[test]
    fn half_open_overlap() {
        assert!(iv(0, 10).overlaps(&iv(9, 20)));
        assert!(!iv(0, 10).overlaps(&iv(10, 20)));
        assert!(!iv(10, 20).overlaps(&iv(0, 10)));
        assert!(iv(0, 30).overlaps(&iv(10, 20)));
    }

    #[test]
    fn containment_is_inclusive_on_the_closing_edge() {
        assert!(iv(0, 10).contains(&iv(0, 10)));
        assert!(iv(0, 10).contains(&iv(5, 10)));
        assert!(!iv(0, 10).contains(&iv(5, 11)));
    }

    #[test]
    fn coalesces_overlapping_and_touching_members() {
        let set = IntervalSet::new(vec![iv(20, 30), iv(0, 10), iv(10, 15), iv(25, 40)]);
        assert_eq!(set.as_slice(), &[iv(0, 15), iv(20, 40)]);
    }

    #[test]
    fn covers_across_a_merged_boundary() {
        // A window split at midnight must still cover a span crossing it
        let set = IntervalSet::new(vec![iv(0, 60), iv(60, 120)]);
        assert!(set.covers(&iv(30, 90)));
        assert!(set.covers(&iv(0, 120)));
        assert!(!set.covers(&iv(30, 121)));
    }

    #[test]
    fn overlap_probe_finds_the_right_member() {
        let set = IntervalSet::new(vec![iv(0, 10), iv(20, 30), iv(50, 60)]);
        assert!(set.overlaps(&iv(25, 26)));
        assert!(set.overlaps(&iv(5, 55)));
        assert!(!set.overlaps(&iv(10, 20)));
        assert!(!set.overlaps(&iv(30, 50)));
        assert!(!set.overlaps(&iv(60, 100)));
    }

    #[test]
    fn clamp_trims_and_drops() {
        let mut set = IntervalSet::new(vec![iv(0, 10), iv(20, 30), iv(50, 60)]);
        set.clamp(ts(5), ts(55));
        assert_eq!(set.as_slice(), &[iv(5, 10), iv(20, 30), iv(50, 55)]);

        let mut set = IntervalSet::new(vec![iv(0, 10)]);
        set.clamp(ts(10), ts(20));
        assert!(set.is_empty());
    }
}
