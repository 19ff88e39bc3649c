use std::fmt;

/// A zero-based row/column position. Columns count bytes within their row.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Point {
    pub row: u32,
    pub column: u32,
}

impl Point {
    pub const ZERO: Self = Self { row: 0, column: 0 };

    #[inline]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Returns the position reached after `delta` more text.
    #[inline]
    pub fn advance(self, delta: PointDelta) -> Self {
        if delta.rows == 0 {
            Self::new(self.row, self.column + delta.columns)
        } else {
            Self::new(self.row + delta.rows, delta.columns)
        }
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// The row/column distance covered by a piece of text.
///
/// When `rows` is zero, `columns` is a span within one row; otherwise it is
/// the column reached in the final row.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct PointDelta {
    pub rows: u32,
    pub columns: u32,
}

impl PointDelta {
    pub const ZERO: Self = Self { rows: 0, columns: 0 };

    #[inline]
    pub const fn new(rows: u32, columns: u32) -> Self {
        Self { rows, columns }
    }

    /// Measures `text`.
    pub fn of(text: &str) -> Self {
        let mut delta = Self::ZERO;
        for byte in text.bytes() {
            if byte == b'\n' {
                delta.rows += 1;
                delta.columns = 0;
            } else {
                delta.columns += 1;
            }
        }
        delta
    }

    /// Returns the delta spanning `self` followed by `other`.
    #[inline]
    pub fn concat(self, other: Self) -> Self {
        if other.rows == 0 {
            Self::new(self.rows, self.columns + other.columns)
        } else {
            Self::new(self.rows + other.rows, other.columns)
        }
    }

    /// Returns the delta from `start` to `end`. `end` must not precede `start`.
    pub fn between(start: Point, end: Point) -> Self {
        debug_assert!(start <= end);
        if start.row == end.row {
            Self::new(0, end.column - start.column)
        } else {
            Self::new(end.row - start.row, end.column)
        }
    }
}

impl fmt::Debug for PointDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+({}, {})", self.rows, self.columns)
    }
}

/// A start/end pair of points.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct PointRange {
    pub start: Point,
    pub end: Point,
}

impl PointRange {
    #[inline]
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }
}

impl fmt::Debug for PointRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}
