//! Robot pose at cell granularity.

use super::direction::Direction;
use super::point::CellCoord;

/// Current cell plus heading. Position is tracked per whole cell; partial
/// travel inside a cell is absorbed by the next primitive's encoder reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pose {
    pub cell: CellCoord,
    pub heading: Direction,
}

impl Pose {
    #[inline]
    pub fn new(x: i32, y: i32, heading: Direction) -> Self {
        Self {
            cell: CellCoord::new(x, y),
            heading,
        }
    }

    /// Advance one cell along the heading, clamped to the grid.
    pub fn advance_clamped(&mut self, cols: i32, rows: i32) {
        let next = self.cell.step(self.heading);
        self.cell = CellCoord::new(next.x.clamp(0, cols - 1), next.y.clamp(0, rows - 1));
    }
}
