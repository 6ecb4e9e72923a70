//! Static augmented interval tree over half-open byte intervals.
//!
//! Intervals are kept sorted by start. The tree is implicit: the node of the
//! sub-slice `[lo, hi)` is its midpoint, and `max_end[mid]` holds the largest
//! end in that sub-slice, which lets an overlap query skip whole subtrees.

use std::fmt;

/// One text change, in pre-edit coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Interval {
    /// Start offset (inclusive)
    pub start: usize,
    /// End offset (exclusive)
    pub end: usize,
    /// Net length change of the edit
    pub delta: isize,
}

impl Interval {
    fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}) {:+}", self.start, self.end, self.delta)
    }
}

#[derive(Debug, Clone, Default)]
pub struct IntervalTree {
    intervals: Vec<Interval>,
    max_end: Vec<usize>,
}

impl IntervalTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Insert an interval; empty intervals are ignored
    pub fn insert(&mut self, interval: Interval) {
        if interval.start >= interval.end {
            return;
        }
        let at = self.intervals.partition_point(|i| *i <= interval);
        self.intervals.insert(at, interval);
        self.rebuild();
    }

    /// Intervals overlapping `[start, end)`, sorted by start.
    /// An empty query range overlaps nothing.
    pub fn overlapping(&self, start: usize, end: usize) -> Vec<Interval> {
        let mut found = Vec::new();
        if start < end {
            self.collect(0, self.intervals.len(), start, end, &mut found);
        }
        found
    }

    /// True if any interval overlaps `[start, end)`
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        !self.overlapping(start, end).is_empty()
    }

    /// Sum of the deltas of the intervals overlapping `[start, end)`
    pub fn delta_sum(&self, start: usize, end: usize) -> isize {
        self.overlapping(start, end).iter().map(|i| i.delta).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interval> {
        self.intervals.iter()
    }

    fn collect(&self, lo: usize, hi: usize, start: usize, end: usize, found: &mut Vec<Interval>) {
        if lo >= hi {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        if self.max_end[mid] <= start {
            return;
        }
        self.collect(lo, mid, start, end, found);
        let interval = self.intervals[mid];
        if interval.overlaps(start, end) {
            found.push(interval);
        }
        // everything to the right starts at or after `interval.start`
        if interval.start < end {
            self.collect(mid + 1, hi, start, end, found);
        }
    }

    fn rebuild(&mut self) {
        self.max_end = vec![0; self.intervals.len()];
        self.fill(0, self.intervals.len());
    }

    fn fill(&mut self, lo: usize, hi: usize) -> usize {
        if lo >= hi {
            return 0;
        }
        let mid = lo + (hi - lo) / 2;
        let left = self.fill(lo, mid);
        let right = self.fill(mid + 1, hi);
        let max = self.intervals[mid].end.max(left).max(right);
        self.max_end[mid] = max;
        max
    }
}

impl FromIterator<Interval> for IntervalTree {
    fn from_iter<I: IntoIterator<Item = Interval>>(iter: I) -> Self {
        let mut intervals: Vec<Interval> = iter.into_iter().filter(|i| i.start < i.end).collect();
        intervals.sort();
        let mut tree = Self {
            intervals,
            max_end: Vec::new(),
        };
        tree.rebuild();
        tree
    }
}
