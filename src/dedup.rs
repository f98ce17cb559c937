//! First-seen deduplication of decoded points.
//!
//! The whole retained set lives in memory for the duration of a conversion;
//! there is no spill to disk, so the largest convertible cloud is bounded by
//! available memory.

use std::collections::HashSet;

use crate::ply::RecordOutcome;
use crate::point::{DedupKey, Record};

/// Upper bound for capacity reserved up front from a declared count.
const MAX_PRESIZE: u64 = 1 << 22;

/// Points retained in first-seen order, plus the counters of one pass.
#[derive(Debug, Default)]
pub struct PointSet {
    seen: HashSet<DedupKey>,
    points: Vec<Record>,
    processed: u64,
    malformed: u64,
}

impl PointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve room for `expected` points, capped so a bogus header count
    /// cannot trigger a huge allocation.
    pub fn with_capacity(expected: u64) -> Self {
        let cap = expected.min(MAX_PRESIZE) as usize;
        Self {
            seen: HashSet::with_capacity(cap),
            points: Vec::with_capacity(cap),
            processed: 0,
            malformed: 0,
        }
    }

    /// Count one examined record and keep it if its key is new.
    ///
    /// Returns true when the record was retained.
    pub fn observe(&mut self, outcome: RecordOutcome) -> bool {
        match outcome {
            RecordOutcome::Point(record) => self.insert(record),
            RecordOutcome::Malformed => {
                self.processed += 1;
                self.malformed += 1;
                false
            }
        }
    }

    /// Count `record` and keep it unless an equal key was seen before.
    pub fn insert(&mut self, record: Record) -> bool {
        self.processed += 1;
        if self.seen.insert(record.key()) {
            self.points.push(record);
            true
        } else {
            false
        }
    }

    /// Records examined, valid or not.
    #[inline]
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Records retained.
    #[inline]
    pub fn unique(&self) -> u64 {
        self.points.len() as u64
    }

    /// Records that did not yield a point.
    #[inline]
    pub fn malformed(&self) -> u64 {
        self.malformed
    }

    /// Valid records dropped as duplicates.
    #[inline]
    pub fn duplicates(&self) -> u64 {
        self.processed - self.malformed - self.unique()
    }

    /// Retained points in first-seen order.
    #[inline]
    pub fn points(&self) -> &[Record] {
        &self.points
    }
}

impl Extend<Record> for PointSet {
    fn extend<T: IntoIterator<Item = Record>>(&mut self, iter: T) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl FromIterator<Record> for PointSet {
    fn from_iter<T: IntoIterator<Item = Record>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_wins() {
        let mut set = PointSet::new();
        assert!(set.insert(Record::new(1.0, 2.0, 3.0, [1, 1, 1])));
        assert!(set.insert(Record::new(4.0, 5.0, 6.0, [1, 1, 1])));
        assert!(!set.insert(Record::new(1.0000001, 2.0, 3.0, [1, 1, 1])));
        assert_eq!(set.unique(), 2);
        assert_eq!(set.processed(), 3);
        assert_eq!(set.duplicates(), 1);
        assert_eq!(set.points()[0].x(), 1.0);
        assert_eq!(set.points()[1].x(), 4.0);
    }

    #[test]
    fn test_malformed_counts_as_processed() {
        let mut set = PointSet::with_capacity(10);
        set.observe(RecordOutcome::Malformed);
        set.observe(RecordOutcome::Point(Record::new(0.0, 0.0, 0.0, [0; 3])));
        assert_eq!(set.processed(), 2);
        assert_eq!(set.unique(), 1);
        assert_eq!(set.malformed(), 1);
        assert_eq!(set.duplicates(), 0);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let records: Vec<Record> = (0..1000)
            .map(|i| Record::new((i % 100) as f64, 0.0, 0.0, [0; 3]))
            .collect();
        let set: PointSet = records.into_iter().collect();
        assert_eq!(set.unique(), 100);
        let xs: Vec<f64> = set.points().iter().map(Record::x).collect();
        let expected: Vec<f64> = (0..100).map(|i| i as f64).collect();
        assert_eq!(xs, expected);
    }
}
