//! Source location tracking

use serde::{Deserialize, Serialize};

/// Index of a source file within a [`Forest`](crate::Forest).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileId(pub u32);

/// A span representing a range in one source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// File the range belongs to
    pub file: FileId,
    /// Byte offset of the start
    pub start: usize,
    /// Byte offset of the end (exclusive)
    pub end: usize,
    /// 1-based line of `start`
    pub line: u32,
}

impl Span {
    pub fn new(file: FileId, start: usize, end: usize, line: u32) -> Self {
        Self { file, start, end, line }
    }

    pub fn dummy() -> Self {
        Self {
            file: FileId(0),
            start: 0,
            end: 0,
            line: 0,
        }
    }

    /// Merge two spans into one that covers both.
    ///
    /// The file and line are taken from whichever span starts first.
    pub fn merge(self, other: Span) -> Span {
        let first = if other.start < self.start { other } else { self };
        Span {
            file: first.file,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line: first.line,
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::dummy()
    }
}
