//! Incremental wall map of the maze.

use tracing::debug;

use super::cell::{Cell, FLOOD_UNREACHABLE};
use super::direction::{Direction, DIRECTIONS};
use super::point::CellCoord;
use super::pose::Pose;
use crate::config::MazeConfig;

/// Wall map plus flood field for one maze.
///
/// Walls are stored on both cells sharing an edge and always updated in
/// pairs, so the two views can never disagree. Queries outside the grid
/// report walls on every side, which keeps the planner inside the maze
/// without bounds checks at every call site.
#[derive(Clone, Debug)]
pub struct MazeMap {
    cols: i32,
    rows: i32,
    cells: Vec<Cell>,
    goal: CellCoord,
    start: CellCoord,
}

impl MazeMap {
    /// Create a map with boundary walls discovered and the flood field
    /// seeded with Manhattan distances to the goal.
    pub fn new(cols: i32, rows: i32, start: CellCoord, goal: CellCoord) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let mut map = Self {
            cols,
            rows,
            cells: vec![Cell::new(); (cols * rows) as usize],
            goal: CellCoord::new(goal.x.clamp(0, cols - 1), goal.y.clamp(0, rows - 1)),
            start: CellCoord::new(start.x.clamp(0, cols - 1), start.y.clamp(0, rows - 1)),
        };
        for x in 0..cols {
            map.set_wall(x, 0, Direction::South, true);
            map.set_wall(x, rows - 1, Direction::North, true);
        }
        for y in 0..rows {
            map.set_wall(0, y, Direction::West, true);
            map.set_wall(cols - 1, y, Direction::East, true);
        }
        map.seed_flood();
        map
    }

    pub fn from_config(config: &MazeConfig) -> Self {
        Self::new(
            config.cols,
            config.rows,
            CellCoord::new(config.start[0], config.start[1]),
            CellCoord::new(config.goal[0], config.goal[1]),
        )
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn goal(&self) -> CellCoord {
        self.goal
    }

    pub fn start(&self) -> CellCoord {
        self.start
    }

    /// Move the goal (clamped into the grid). The flood field is stale
    /// until the next [`update_flood`](Self::update_flood).
    pub fn set_goal(&mut self, x: i32, y: i32) {
        self.goal = CellCoord::new(x.clamp(0, self.cols - 1), y.clamp(0, self.rows - 1));
    }

    /// Move the start cell (clamped into the grid).
    pub fn set_start(&mut self, x: i32, y: i32) {
        self.start = CellCoord::new(x.clamp(0, self.cols - 1), y.clamp(0, self.rows - 1));
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.cols && y >= 0 && y < self.rows
    }

    #[inline]
    pub(super) fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some((y * self.cols + x) as usize)
        } else {
            None
        }
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    #[inline]
    pub(super) fn cell_mut_at(&mut self, index: usize) -> &mut Cell {
        &mut self.cells[index]
    }

    /// Record a wall edge. Both cells sharing the edge are updated and the
    /// side is marked discovered on each. Out-of-bounds cells are ignored.
    pub fn set_wall(&mut self, x: i32, y: i32, dir: Direction, present: bool) {
        if let Some(i) = self.index(x, y) {
            if present && !self.cells[i].walls[dir.index()] {
                debug!("Wall discovered: ({}, {}) side {}", x, y, dir);
            }
            self.cells[i].walls[dir.index()] = present;
            self.cells[i].discovered[dir.index()] = true;

            let neighbor = CellCoord::new(x, y).step(dir);
            if let Some(j) = self.index(neighbor.x, neighbor.y) {
                let opp = dir.opposite();
                self.cells[j].walls[opp.index()] = present;
                self.cells[j].discovered[opp.index()] = true;
            }
        }
    }

    /// Is there a known wall on this side? Cells outside the grid report
    /// walls everywhere.
    #[inline]
    pub fn has_wall(&self, x: i32, y: i32, dir: Direction) -> bool {
        match self.index(x, y) {
            Some(i) => self.cells[i].walls[dir.index()],
            None => true,
        }
    }

    /// Has this side of the cell been observed?
    #[inline]
    pub fn is_discovered(&self, x: i32, y: i32, dir: Direction) -> bool {
        match self.index(x, y) {
            Some(i) => self.cells[i].discovered[dir.index()],
            None => false,
        }
    }

    pub fn mark_visited(&mut self, x: i32, y: i32) {
        if let Some(i) = self.index(x, y) {
            self.cells[i].visited = true;
        }
    }

    pub fn is_visited(&self, x: i32, y: i32) -> bool {
        match self.index(x, y) {
            Some(i) => self.cells[i].visited,
            None => false,
        }
    }

    /// Count of cells the robot has occupied so far
    pub fn visited_count(&self) -> usize {
        self.cells.iter().filter(|c| c.visited).count()
    }

    /// Flood distance of a cell; out-of-bounds is unreachable.
    #[inline]
    pub fn flood_at(&self, x: i32, y: i32) -> u16 {
        match self.index(x, y) {
            Some(i) => self.cells[i].flood,
            None => FLOOD_UNREACHABLE,
        }
    }

    /// Directions whose neighbor is in bounds with no known wall between,
    /// in N, E, S, W order.
    pub fn accessible_neighbors(&self, x: i32, y: i32) -> Vec<Direction> {
        DIRECTIONS
            .iter()
            .copied()
            .filter(|&dir| {
                let n = CellCoord::new(x, y).step(dir);
                self.in_bounds(n.x, n.y) && !self.has_wall(x, y, dir)
            })
            .collect()
    }

    /// ASCII render of the known walls, with start/goal/robot markers.
    pub fn render_walls(&self, robot: Option<Pose>) -> String {
        let mut out = String::new();
        for y in (0..self.rows).rev() {
            for x in 0..self.cols {
                out.push('+');
                out.push_str(if self.has_wall(x, y, Direction::North) {
                    "---"
                } else {
                    "   "
                });
            }
            out.push_str("+\n");
            for x in 0..self.cols {
                out.push(if self.has_wall(x, y, Direction::West) {
                    '|'
                } else {
                    ' '
                });
                out.push(' ');
                out.push(self.cell_marker(x, y, robot));
                out.push(' ');
            }
            out.push(if self.has_wall(self.cols - 1, y, Direction::East) {
                '|'
            } else {
                ' '
            });
            out.push('\n');
        }
        for x in 0..self.cols {
            out.push('+');
            out.push_str(if self.has_wall(x, 0, Direction::South) {
                "---"
            } else {
                "   "
            });
        }
        out.push('+');
        out
    }

    fn cell_marker(&self, x: i32, y: i32, robot: Option<Pose>) -> char {
        if let Some(pose) = robot {
            if pose.cell == CellCoord::new(x, y) {
                return pose.heading.as_char();
            }
        }
        if self.goal == CellCoord::new(x, y) {
            'G'
        } else if self.start == CellCoord::new(x, y) {
            'S'
        } else if self.is_visited(x, y) {
            '.'
        } else {
            ' '
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_map() -> MazeMap {
        MazeMap::new(4, 4, CellCoord::new(0, 0), CellCoord::new(3, 3))
    }

    #[test]
    fn test_boundary_walls_at_init() {
        let map = open_map();
        for x in 0..4 {
            assert!(map.has_wall(x, 0, Direction::South));
            assert!(map.has_wall(x, 3, Direction::North));
            assert!(map.is_discovered(x, 0, Direction::South));
        }
        for y in 0..4 {
            assert!(map.has_wall(0, y, Direction::West));
            assert!(map.has_wall(3, y, Direction::East));
        }
        // Interior edges start open and undiscovered
        assert!(!map.has_wall(1, 1, Direction::North));
        assert!(!map.is_discovered(1, 1, Direction::North));
    }

    #[test]
    fn test_set_wall_mirrors_to_neighbor() {
        let mut map = open_map();
        map.set_wall(1, 1, Direction::North, true);
        assert!(map.has_wall(1, 1, Direction::North));
        assert!(map.has_wall(1, 2, Direction::South));
        assert!(map.is_discovered(1, 2, Direction::South));

        map.set_wall(1, 1, Direction::North, false);
        assert!(!map.has_wall(1, 1, Direction::North));
        assert!(!map.has_wall(1, 2, Direction::South));
        // Clearing still counts as an observation
        assert!(map.is_discovered(1, 2, Direction::South));
    }

    #[test]
    fn test_out_of_bounds_semantics() {
        let mut map = open_map();
        map.set_wall(-1, 0, Direction::North, true);
        map.set_wall(0, 99, Direction::South, true);
        // No-ops: nothing inside changed
        assert!(!map.has_wall(0, 0, Direction::North));
        // Outside cells report walls on every side
        assert!(map.has_wall(-1, 0, Direction::East));
        assert!(map.has_wall(4, 4, Direction::South));
        assert_eq!(map.flood_at(-1, -1), FLOOD_UNREACHABLE);
    }

    #[test]
    fn test_accessible_neighbors_order() {
        let mut map = open_map();
        assert_eq!(
            map.accessible_neighbors(1, 1),
            vec![
                Direction::North,
                Direction::East,
                Direction::South,
                Direction::West
            ]
        );
        map.set_wall(1, 1, Direction::East, true);
        assert_eq!(
            map.accessible_neighbors(1, 1),
            vec![Direction::North, Direction::South, Direction::West]
        );
        // Corner cell only sees inward
        assert_eq!(
            map.accessible_neighbors(0, 0),
            vec![Direction::North, Direction::East]
        );
    }

    #[test]
    fn test_goal_and_start_clamped() {
        let mut map = open_map();
        map.set_goal(100, -5);
        assert_eq!(map.goal(), CellCoord::new(3, 0));
        map.set_start(-2, 100);
        assert_eq!(map.start(), CellCoord::new(0, 3));

        let clamped = MazeMap::new(4, 4, CellCoord::new(-1, -1), CellCoord::new(9, 9));
        assert_eq!(clamped.start(), CellCoord::new(0, 0));
        assert_eq!(clamped.goal(), CellCoord::new(3, 3));
    }

    #[test]
    fn test_visited_tracking() {
        let mut map = open_map();
        assert!(!map.is_visited(2, 2));
        map.mark_visited(2, 2);
        map.mark_visited(2, 2);
        assert!(map.is_visited(2, 2));
        assert_eq!(map.visited_count(), 1);
        map.mark_visited(-3, 0);
        assert_eq!(map.visited_count(), 1);
    }

    #[test]
    fn test_render_walls_small_map() {
        let map = MazeMap::new(2, 2, CellCoord::new(0, 0), CellCoord::new(1, 1));
        let expected = "\
+---+---+
|     G |
+   +   +
| S     |
+---+---+";
        assert_eq!(map.render_walls(None), expected);
    }

    #[test]
    fn test_render_shows_robot_heading() {
        let map = MazeMap::new(2, 2, CellCoord::new(0, 0), CellCoord::new(1, 1));
        let rendered = map.render_walls(Some(Pose::new(0, 1, Direction::East)));
        assert!(rendered.contains('E'));
    }
}
