//! Flood-fill distance field over the wall map.
//!
//! The field is a BFS distance transform from the goal. Edges with no known
//! wall are treated as open, so the field is optimistic about unexplored
//! territory and tightens as walls are discovered.

use std::collections::VecDeque;

use super::cell::FLOOD_UNREACHABLE;
use super::direction::{Direction, DIRECTIONS};
use super::map::MazeMap;
use super::point::CellCoord;
use super::pose::Pose;

impl MazeMap {
    /// Seed the flood field with Manhattan distances to the goal, ignoring
    /// walls. Only meaningful before the first [`update_flood`](Self::update_flood).
    pub fn seed_flood(&mut self) {
        let goal = self.goal();
        for y in 0..self.rows() {
            for x in 0..self.cols() {
                if let Some(i) = self.index(x, y) {
                    let d = CellCoord::new(x, y).manhattan_distance(&goal);
                    self.cell_mut_at(i).flood = d.min(FLOOD_UNREACHABLE as i32 - 1) as u16;
                }
            }
        }
    }

    /// Rebuild the flood field: breadth-first from the goal across every
    /// edge with no known wall. Cells the goal cannot reach keep
    /// [`FLOOD_UNREACHABLE`].
    pub fn update_flood(&mut self) {
        for y in 0..self.rows() {
            for x in 0..self.cols() {
                if let Some(i) = self.index(x, y) {
                    self.cell_mut_at(i).flood = FLOOD_UNREACHABLE;
                }
            }
        }

        let goal = self.goal();
        if let Some(gi) = self.index(goal.x, goal.y) {
            self.cell_mut_at(gi).flood = 0;
        }

        let mut queue = VecDeque::new();
        queue.push_back(goal);
        while let Some(c) = queue.pop_front() {
            let next = self.flood_at(c.x, c.y).saturating_add(1);
            for dir in DIRECTIONS {
                if self.has_wall(c.x, c.y, dir) {
                    continue;
                }
                let n = c.step(dir);
                if let Some(i) = self.index(n.x, n.y) {
                    if next < self.cell_mut_at(i).flood {
                        self.cell_mut_at(i).flood = next;
                        queue.push_back(n);
                    }
                }
            }
        }
    }

    /// Accessible neighbor with the strictly lowest flood value. The first
    /// match in N, E, S, W order wins ties; `None` when no open neighbor
    /// can reach the goal.
    pub fn next_direction(&self, x: i32, y: i32) -> Option<Direction> {
        let mut best: Option<(Direction, u16)> = None;
        for dir in DIRECTIONS {
            if self.has_wall(x, y, dir) {
                continue;
            }
            let n = CellCoord::new(x, y).step(dir);
            if !self.in_bounds(n.x, n.y) {
                continue;
            }
            let flood = self.flood_at(n.x, n.y);
            if flood == FLOOD_UNREACHABLE {
                continue;
            }
            match best {
                Some((_, lowest)) if flood >= lowest => {}
                _ => best = Some((dir, flood)),
            }
        }
        best.map(|(dir, _)| dir)
    }

    /// ASCII render of the flood field with robot and goal markers.
    pub fn render_flood(&self, robot: Option<Pose>) -> String {
        let mut lines = Vec::new();
        for y in (0..self.rows()).rev() {
            let mut line = String::new();
            for x in 0..self.cols() {
                let here = CellCoord::new(x, y);
                if robot.map(|p| p.cell == here).unwrap_or(false) {
                    line.push_str("   R");
                } else if self.goal() == here {
                    line.push_str("   G");
                } else if self.flood_at(x, y) == FLOOD_UNREACHABLE {
                    line.push_str("   #");
                } else {
                    line.push_str(&format!("{:>4}", self.flood_at(x, y)));
                }
            }
            lines.push(line);
        }
        lines.join("\n")
    }
}
