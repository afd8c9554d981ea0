//! Child addressing
//!
//! An [`Index`] names a slot inside a container: either a single ordinal
//! (with the reserved `FIRST`/`LAST` sentinels) or an `(x, y)` cell.

use nalgebra::Point2;

/// Which form an [`Index`] holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    /// A single ordinal position
    Ordinal,
    /// A two-dimensional cell
    Point,
}

/// Addressing value for children of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Index {
    /// Ordinal position; `i32::MIN` and `i32::MAX` mean first and last
    Ordinal(i32),
    /// Cell position; vertical containers address rows by `y`
    Point(i32, i32),
}

impl Index {
    /// Sentinel for the first slot
    pub const FIRST: Self = Self::Ordinal(i32::MIN);
    /// Sentinel for the last slot (append when inserting)
    pub const LAST: Self = Self::Ordinal(i32::MAX);

    /// Index from a single ordinal
    pub const fn new(ordinal: i32) -> Self {
        Self::Ordinal(ordinal)
    }

    /// Index from two ordinals
    pub const fn xy(x: i32, y: i32) -> Self {
        Self::Point(x, y)
    }

    /// Which form this index holds
    pub const fn index_type(&self) -> IndexType {
        match self {
            Self::Ordinal(_) => IndexType::Ordinal,
            Self::Point(..) => IndexType::Point,
        }
    }

    /// The ordinal, if this is an ordinal index
    pub const fn ordinal(&self) -> Option<i32> {
        match self {
            Self::Ordinal(value) => Some(*value),
            Self::Point(..) => None,
        }
    }

    /// The cell, if this is a point index
    pub fn point(&self) -> Option<Point2<i32>> {
        match self {
            Self::Ordinal(_) => None,
            Self::Point(x, y) => Some(Point2::new(*x, *y)),
        }
    }

    /// True for the `FIRST` sentinel
    pub const fn is_first(&self) -> bool {
        matches!(self, Self::Ordinal(i32::MIN))
    }

    /// True for the `LAST` sentinel
    pub const fn is_last(&self) -> bool {
        matches!(self, Self::Ordinal(i32::MAX))
    }

    /// Position along a single axis: the ordinal, or the row of a cell
    const fn linear(&self) -> i32 {
        match self {
            Self::Ordinal(value) => *value,
            Self::Point(_, y) => *y,
        }
    }

    /// Where a new child goes in a sequence of `len` children
    ///
    /// Out-of-range positions are clamped to the ends.
    pub fn insert_position(&self, len: usize) -> usize {
        if self.is_first() {
            return 0;
        }
        if self.is_last() {
            return len;
        }
        usize::try_from(self.linear()).map_or(0, |position| position.min(len))
    }

    /// Which existing child of a sequence of `len` children this index names
    ///
    /// Returns `None` when the index is outside `[0, len)`.
    pub fn resolve(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        if self.is_first() {
            return Some(0);
        }
        if self.is_last() {
            return Some(len - 1);
        }
        usize::try_from(self.linear())
            .ok()
            .filter(|position| *position < len)
    }
}

impl Default for Index {
    fn default() -> Self {
        Self::LAST
    }
}

impl From<i32> for Index {
    fn from(ordinal: i32) -> Self {
        Self::new(ordinal)
    }
}

impl From<Point2<i32>> for Index {
    fn from(point: Point2<i32>) -> Self {
        Self::xy(point.x, point.y)
    }
}
