//! Byte ranges and line/column conversion

use std::fmt;

use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)` in a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ByteRange {
    /// Start offset (inclusive)
    pub start: usize,
    /// End offset (exclusive)
    pub end: usize,
}

impl ByteRange {
    /// Create a range; `end` is clamped to be at least `start`
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True for zero-length ranges
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if `offset` lies inside the range
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// True if the two half-open ranges share at least one byte
    pub fn overlaps(&self, other: &ByteRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

impl From<(usize, usize)> for ByteRange {
    fn from((start, end): (usize, usize)) -> Self {
        ByteRange::new(start, end)
    }
}

/// Zero-based line and byte column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Line number
    pub line: usize,
    /// Byte offset within the line
    pub character: usize,
}

/// Line/column span as shown to the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineSpan {
    /// Start position
    pub start: Position,
    /// End position
    pub end: Position,
}

/// Byte offset to line/column lookup for one file
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the first character of every line
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    /// Index the given file content
    pub fn new(source: &[u8]) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.iter().enumerate() {
            if *b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// Position of a byte offset; offsets past the end clamp to the end
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        Position {
            line,
            character: offset - self.line_starts[line],
        }
    }

    /// Line/column span of a byte range
    pub fn span(&self, range: ByteRange) -> LineSpan {
        LineSpan {
            start: self.position(range.start),
            end: self.position(range.end),
        }
    }

    /// Number of lines
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
