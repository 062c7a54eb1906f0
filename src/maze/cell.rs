//! Per-cell wall and flood state.

use super::direction::Direction;

/// Flood value for cells the goal cannot currently reach
pub const FLOOD_UNREACHABLE: u16 = u16::MAX;

/// One maze cell: known walls, discovery bookkeeping, flood distance.
///
/// A side with `discovered` unset and `walls` unset is optimistically
/// treated as open by the planner until the robot scans it.
#[derive(Clone, Copy, Debug)]
pub struct Cell {
    /// Wall present on each side, indexed by [`Direction`]
    pub walls: [bool; 4],

    /// Side has been observed at least once
    pub discovered: [bool; 4],

    /// Robot has occupied this cell
    pub visited: bool,

    /// Flood-fill distance to the goal, in cells
    pub flood: u16,
}

impl Cell {
    #[inline]
    pub fn new() -> Self {
        Self {
            walls: [false; 4],
            discovered: [false; 4],
            visited: false,
            flood: FLOOD_UNREACHABLE,
        }
    }

    /// Is there a known wall on this side?
    #[inline]
    pub fn wall(&self, dir: Direction) -> bool {
        self.walls[dir.index()]
    }

    /// Has this side been observed?
    #[inline]
    pub fn side_discovered(&self, dir: Direction) -> bool {
        self.discovered[dir.index()]
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::new()
    }
}
