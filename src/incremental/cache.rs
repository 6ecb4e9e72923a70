//! Per-file artifact cache that survives small edits.
//!
//! Each entry records the byte range its artifact describes and the byte
//! range whose modification invalidates it. Between recompilations, a lookup
//! drops entries touched by an edit and shifts the rest by the net length
//! change of the edits before them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{ForwardChanges, Relocatable};
use crate::span::{ByteRange, LineIndex};

#[derive(Debug, Clone)]
struct CacheEntry<A> {
    artifact: A,
    describes: ByteRange,
    invalidates: ByteRange,
}

#[derive(Debug)]
struct FileEntries<A> {
    entries: Vec<CacheEntry<A>>,
}

/// Cache of artifacts per file, with an edit generation per file
#[derive(Debug)]
pub struct IncrementalCache<A> {
    files: HashMap<PathBuf, FileEntries<A>>,
    generations: HashMap<PathBuf, u64>,
}

impl<A> Default for IncrementalCache<A> {
    fn default() -> Self {
        Self {
            files: HashMap::new(),
            generations: HashMap::new(),
        }
    }
}

/// Entries of one computation pass, committed all at once
#[derive(Debug)]
pub struct CacheTransaction<A> {
    file: PathBuf,
    generation: u64,
    entries: Vec<CacheEntry<A>>,
}

impl<A> CacheTransaction<A> {
    /// Record an artifact describing `describes`, valid while `invalidates` is untouched
    pub fn record(&mut self, artifact: A, describes: ByteRange, invalidates: ByteRange) {
        self.entries.push(CacheEntry {
            artifact,
            describes,
            invalidates,
        });
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<A: Relocatable> IncrementalCache<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a pass for `file` at its current edit generation
    pub fn begin(&self, file: &Path) -> CacheTransaction<A> {
        CacheTransaction {
            file: file.to_path_buf(),
            generation: self.generation(file),
            entries: Vec::new(),
        }
    }

    /// Replace the file's entries with the transaction's.
    ///
    /// Returns false, keeping the old entries, if the file was edited after
    /// the transaction began.
    pub fn commit(&mut self, transaction: CacheTransaction<A>) -> bool {
        let current = self.generation(&transaction.file);
        if current != transaction.generation {
            tracing::debug!(
                "discarding {} cache entries for {}: generation {} superseded by {}",
                transaction.entries.len(),
                transaction.file.display(),
                transaction.generation,
                current
            );
            return false;
        }
        self.files.insert(
            transaction.file,
            FileEntries {
                entries: transaction.entries,
            },
        );
        true
    }

    /// Record that `file` was edited; open transactions for it become stale
    pub fn bump_generation(&mut self, file: &Path) -> u64 {
        let generation = self.generations.entry(file.to_path_buf()).or_insert(0);
        *generation += 1;
        *generation
    }

    pub fn generation(&self, file: &Path) -> u64 {
        self.generations.get(file).copied().unwrap_or(0)
    }

    /// Artifacts of `file` still valid after `changes`, relocated into the
    /// edited text. `None` if the file has no cache.
    pub fn lookup(&self, file: &Path, changes: &ForwardChanges, lines: &LineIndex) -> Option<Vec<A>> {
        let Some(cached) = self.files.get(file) else {
            tracing::debug!("code lens cache miss for {}", file.display());
            return None;
        };
        let tree = changes.tree();

        let mut artifacts = Vec::with_capacity(cached.entries.len());
        for entry in &cached.entries {
            if tree.overlaps(entry.invalidates.start, entry.invalidates.end) {
                continue;
            }
            if entry.describes.start == 0 {
                artifacts.push(entry.artifact.clone());
                continue;
            }
            let start = shift(entry.describes.start, tree.delta_sum(0, entry.describes.start));
            let end = shift(entry.describes.end, tree.delta_sum(0, entry.describes.end));
            let range = ByteRange::new(start, end);
            artifacts.push(entry.artifact.relocated(range, lines.span(range)));
        }
        tracing::debug!(
            "code lens cache hit for {}: {} of {} entries survive",
            file.display(),
            artifacts.len(),
            cached.entries.len()
        );
        Some(artifacts)
    }

    /// Drop everything cached for `file`
    pub fn remove(&mut self, file: &Path) {
        self.files.remove(file);
    }

    pub fn contains(&self, file: &Path) -> bool {
        self.files.contains_key(file)
    }
}

fn shift(offset: usize, delta: isize) -> usize {
    offset.saturating_add_signed(delta)
}
