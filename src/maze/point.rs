//! Cell coordinates on the maze grid.

use super::direction::Direction;

/// Integer cell indices. `x` is the column, `y` the row; (0, 0) is the
/// south-west corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct CellCoord {
    /// X coordinate (column index)
    pub x: i32,
    /// Y coordinate (row index)
    pub y: i32,
}

impl CellCoord {
    /// Create a new cell coordinate
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell one step along a heading
    #[inline]
    pub fn step(self, dir: Direction) -> CellCoord {
        let (dx, dy) = dir.offset();
        CellCoord::new(self.x + dx, self.y + dy)
    }

    /// Manhattan distance to another coordinate
    #[inline]
    pub fn manhattan_distance(&self, other: &CellCoord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}
