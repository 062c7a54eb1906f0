//! Maze model: walls, flood field, and heading algebra.
//!
//! The map starts optimistic (no walls beyond the boundary) and fills in as
//! the robot scans each cell it occupies. The flood field is a BFS distance
//! transform from the goal over edges with no known wall, so the next move
//! is always the best move given everything seen so far.

mod cell;
mod direction;
mod flood;
mod map;
mod point;
mod pose;

pub use cell::{Cell, FLOOD_UNREACHABLE};
pub use direction::{Direction, DIRECTIONS};
pub use map::MazeMap;
pub use point::CellCoord;
pub use pose::Pose;
