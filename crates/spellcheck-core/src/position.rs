//! Document coordinates.
//!
//! The engine works in line/column coordinates (columns count Unicode scalar
//! values from the start of the line). Ranges are half-open: `start` is
//! inclusive, `end` exclusive. A range whose `start == end` is empty but still
//! anchored at a position.

use std::cmp::Ordering;
use std::fmt;

/// A line/column position in a document.
///
/// `line` and `column` are zero-based; `column` counts `char`s from the start
/// of the line. The position one past the last character of a line and the
/// position at column 0 of the next line are distinct coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Zero-based line number.
    pub line: usize,
    /// Zero-based character column within the line.
    pub column: usize,
}

impl Position {
    /// Create a position.
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// The start of the document.
    pub const fn start() -> Self {
        Self { line: 0, column: 0 }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then(self.column.cmp(&other.column))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.line, self.column)
    }
}

/// A half-open range of document positions (`start..end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocRange {
    /// Range start (inclusive).
    pub start: Position,
    /// Range end (exclusive).
    pub end: Position,
}

impl DocRange {
    /// Create a range. `start` must not be greater than `end`.
    pub fn new(start: Position, end: Position) -> Self {
        debug_assert!(start <= end, "range start {start} after end {end}");
        Self { start, end }
    }

    /// An empty range anchored at `pos`.
    pub const fn collapsed(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Convenience constructor from raw line/column quadruples.
    pub fn from_coords(
        start_line: usize,
        start_column: usize,
        end_line: usize,
        end_column: usize,
    ) -> Self {
        Self::new(
            Position::new(start_line, start_column),
            Position::new(end_line, end_column),
        )
    }

    /// Whether this range covers no positions.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether `pos` lies inside the range (half-open).
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Whether `other` lies fully inside this range.
    pub fn contains_range(&self, other: &DocRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether the two ranges share at least one position.
    ///
    /// Empty ranges overlap nothing, mirroring the half-open convention.
    pub fn overlaps(&self, other: &DocRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether the ranges overlap, or one is anchored inside the other.
    ///
    /// Unlike [`overlaps`](Self::overlaps) this also holds for an empty range
    /// sitting inside (or at the start of) a non-empty one, which is how a
    /// collapsed deletion point relates to a pending job covering it.
    pub fn interacts(&self, other: &DocRange) -> bool {
        self.overlaps(other) || self.contains(other.start) || other.contains(self.start)
    }

    /// The smallest range covering both `self` and `other`.
    pub fn union(&self, other: &DocRange) -> DocRange {
        DocRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// The shared sub-range, if any (`None` when disjoint or empty).
    pub fn intersect(&self, other: &DocRange) -> Option<DocRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start < end {
            Some(DocRange { start, end })
        } else {
            None
        }
    }

    /// Number of full lines spanned beyond the first (`0` for a single-line range).
    pub fn line_span(&self) -> usize {
        self.end.line - self.start.line
    }
}

impl fmt::Display for DocRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}]", self.start, self.end)
    }
}
