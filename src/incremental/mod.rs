//! # Incremental Invalidation
//!
//! Reuse of editor artifacts across text edits made since the last
//! compilation. Edits are recorded as [`ForwardChanges`]: intervals in the
//! coordinates of the compiled text, each carrying its net length change.
//!
//! ```text
//! compile ──▶ generate ──▶ CacheTransaction ──commit──▶ IncrementalCache
//! edit    ──▶ ForwardChanges ──────────────────lookup──▶ relocated artifacts
//! ```

pub mod cache;
pub mod code_lens;
pub mod interval_tree;

pub use cache::{CacheTransaction, IncrementalCache};
pub use code_lens::{CodeLens, Command};
pub use interval_tree::{Interval, IntervalTree};

use crate::span::{ByteRange, LineSpan};

/// An artifact that can be moved to a new position without recomputing it
pub trait Relocatable: Clone {
    /// Copy of the artifact describing `range`, shown at `span`
    fn relocated(&self, range: ByteRange, span: LineSpan) -> Self;
}

/// Edits made to a file since it was last compiled, in compiled coordinates
#[derive(Debug, Clone, Default)]
pub struct ForwardChanges {
    tree: IntervalTree,
}

impl ForwardChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `replaced` was replaced by `new_len` bytes.
    ///
    /// The recorded interval extends one byte past the replaced range, so a
    /// pure insertion at `offset` is the interval `[offset, offset + 1)`.
    pub fn replace(&mut self, replaced: ByteRange, new_len: usize) {
        let delta = new_len as isize - replaced.len() as isize;
        self.tree.insert(Interval {
            start: replaced.start,
            end: replaced.end + 1,
            delta,
        });
    }

    /// Record an insertion of `len` bytes at `offset`
    pub fn insert(&mut self, offset: usize, len: usize) {
        self.replace(ByteRange::new(offset, offset), len);
    }

    /// Record a deletion of `range`
    pub fn delete(&mut self, range: ByteRange) {
        self.replace(range, 0);
    }

    /// Merge changes recorded later against the same compiled text
    pub fn extend(&mut self, other: &ForwardChanges) {
        for interval in other.tree.iter() {
            self.tree.insert(*interval);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn tree(&self) -> &IntervalTree {
        &self.tree
    }
}

impl FromIterator<Interval> for ForwardChanges {
    fn from_iter<I: IntoIterator<Item = Interval>>(iter: I) -> Self {
        Self {
            tree: iter.into_iter().collect(),
        }
    }
}
