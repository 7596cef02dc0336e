use std::fmt;

use crate::query::QueryHit;

/// A `(row, column)` position. Rows are 0-indexed, columns are byte offsets
/// within the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl From<tree_sitter::Point> for Position {
    fn from(point: tree_sitter::Point) -> Self {
        Self {
            row: point.row,
            column: point.column,
        }
    }
}

/// A matched span, identical in shape for structural and fallback matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capture {
    pub start: Position,
    pub end: Position,
}

impl Capture {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Capture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start.row, self.start.column, self.end.row, self.end.column
        )
    }
}

/// Keep only the last capture of every group of `stride` captures.
///
/// Compound patterns emit one capture per expression for each logical hit;
/// the leading captures only narrow the match, the last one is the finding.
/// Returns exactly the items at indices `stride-1, 2*stride-1, ...`. A
/// trailing partial group is dropped.
pub fn stride_dedup<T: Copy>(captures: &[T], stride: usize) -> Vec<T> {
    if stride <= 1 {
        return captures.to_vec();
    }
    captures
        .iter()
        .skip(stride - 1)
        .step_by(stride)
        .copied()
        .collect()
}

/// Flatten query hits into spans, one per reported capture, each hit's
/// captures in `reported` order. With `deduplicate`, only the last capture of
/// every `reported.len()`-sized group survives.
pub fn extract_captures(hits: &[QueryHit], reported: &[String], deduplicate: bool) -> Vec<Capture> {
    let flat: Vec<Capture> = hits
        .iter()
        .flat_map(|hit| {
            reported.iter().flat_map(move |name| {
                hit.captures
                    .iter()
                    .filter(move |c| &c.name == name)
                    .map(|c| Capture::new(c.start, c.end))
            })
        })
        .collect();
    if deduplicate {
        stride_dedup(&flat, reported.len())
    } else {
        flat
    }
}
