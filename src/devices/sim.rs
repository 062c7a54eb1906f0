//! Deterministic in-process maze simulator.
//!
//! Holds the true wall grid and a continuous robot pose, integrates
//! differential-drive kinematics per motor command, and synthesizes real
//! quadrature phase edges so the production decoder and counters are the ones
//! under test. Range readings raycast over the true walls along the closest
//! cardinal axis. With slip noise disabled every run is bit-identical.

use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::path::Path;
use std::sync::{Arc, Mutex};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use tracing::debug;

use super::{DistanceReading, MotorDriver, RangeSensors, RANGE_MAX_MM};
use crate::config::{RobotConfig, SimConfig};
use crate::encoder::{EncoderCounters, QuadratureDecoder, Wheel};
use crate::error::{Result, VyuhaError};
use crate::maze::{CellCoord, Direction};

/// Ground-truth wall grid of a simulated maze.
///
/// Walls live on edge arrays (`cols+1` vertical planes, `rows+1` horizontal
/// planes) so the two cells sharing an edge cannot disagree. The outer
/// boundary is always walled.
#[derive(Clone, Debug)]
pub struct SimMaze {
    cols: i32,
    rows: i32,
    cell_mm: f32,
    /// Vertical walls, indexed `y * (cols + 1) + x_plane`
    v_walls: Vec<bool>,
    /// Horizontal walls, indexed `y_plane * cols + x`
    h_walls: Vec<bool>,
}

impl SimMaze {
    /// Maze with only the outer boundary walled
    pub fn open(cols: i32, rows: i32, cell_mm: f32) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let mut v_walls = vec![false; ((cols + 1) * rows) as usize];
        let mut h_walls = vec![false; (cols * (rows + 1)) as usize];
        for y in 0..rows {
            v_walls[(y * (cols + 1)) as usize] = true;
            v_walls[(y * (cols + 1) + cols) as usize] = true;
        }
        for x in 0..cols {
            h_walls[x as usize] = true;
            h_walls[(rows * cols + x) as usize] = true;
        }
        Self {
            cols,
            rows,
            cell_mm,
            v_walls,
            h_walls,
        }
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cell_mm(&self) -> f32 {
        self.cell_mm
    }

    /// Set one wall edge; out-of-bounds cells are ignored.
    pub fn set_wall(&mut self, x: i32, y: i32, dir: Direction, present: bool) {
        if x < 0 || x >= self.cols || y < 0 || y >= self.rows {
            return;
        }
        match dir {
            Direction::North => self.h_walls[((y + 1) * self.cols + x) as usize] = present,
            Direction::South => self.h_walls[(y * self.cols + x) as usize] = present,
            Direction::East => self.v_walls[(y * (self.cols + 1) + x + 1) as usize] = present,
            Direction::West => self.v_walls[(y * (self.cols + 1) + x) as usize] = present,
        }
    }

    /// True wall query; cells outside the grid are walled on every side.
    pub fn has_wall(&self, x: i32, y: i32, dir: Direction) -> bool {
        if x < 0 || x >= self.cols || y < 0 || y >= self.rows {
            return true;
        }
        match dir {
            Direction::North => self.h_walls[((y + 1) * self.cols + x) as usize],
            Direction::South => self.h_walls[(y * self.cols + x) as usize],
            Direction::East => self.v_walls[(y * (self.cols + 1) + x + 1) as usize],
            Direction::West => self.v_walls[(y * (self.cols + 1) + x) as usize],
        }
    }

    /// Parse classic maze art: `+---+` horizontal wall lines alternating with
    /// `|   |` cell lines, top row first. Cell interior characters (markers
    /// like `S`/`G`) are ignored.
    pub fn parse(text: &str, cell_mm: f32) -> Result<Self> {
        let lines: Vec<&str> = text
            .lines()
            .map(|l| l.trim_end())
            .filter(|l| !l.is_empty())
            .collect();
        if lines.len() < 3 || lines.len() % 2 == 0 {
            return Err(VyuhaError::Maze(format!(
                "maze text needs 2*rows+1 lines, got {}",
                lines.len()
            )));
        }
        let rows = (lines.len() / 2) as i32;
        let cols = ((lines[0].len() + 3) / 4) as i32;
        if cols < 1 {
            return Err(VyuhaError::Maze("maze text has zero columns".into()));
        }

        let mut maze = Self::open(cols, rows, cell_mm);
        for (i, line) in lines.iter().enumerate() {
            let chars: Vec<char> = line.chars().collect();
            if i % 2 == 0 {
                // Wall line: `---` segments at the cell interiors
                let y_plane = rows - (i as i32 / 2);
                for x in 0..cols {
                    let present = chars.get((4 * x + 1) as usize) == Some(&'-');
                    maze.h_walls[(y_plane * cols + x) as usize] = present;
                }
            } else {
                // Cell line: `|` at each vertical plane
                let y = rows - 1 - (i as i32 / 2);
                for x_plane in 0..=cols {
                    let present = chars.get((4 * x_plane) as usize) == Some(&'|');
                    maze.v_walls[(y * (cols + 1) + x_plane) as usize] = present;
                }
            }
        }

        // The boundary is physical regardless of what the art says
        for y in 0..rows {
            maze.v_walls[(y * (cols + 1)) as usize] = true;
            maze.v_walls[(y * (cols + 1) + cols) as usize] = true;
        }
        for x in 0..cols {
            maze.h_walls[x as usize] = true;
            maze.h_walls[(rows * cols + x) as usize] = true;
        }
        Ok(maze)
    }

    /// Load maze art from a text file.
    pub fn load(path: &Path, cell_mm: f32) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| VyuhaError::Maze(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&text, cell_mm)
    }
}

/// Multiplicative wheel slip: `1 + bias + N(0, stddev)` per integration step.
struct SlipModel {
    bias: f32,
    normal: Option<Normal<f32>>,
    rng: SmallRng,
}

impl SlipModel {
    fn new(sim: &SimConfig) -> Self {
        Self {
            bias: sim.slip_bias,
            normal: if sim.slip_stddev > 0.0 {
                Normal::new(0.0, sim.slip_stddev).ok()
            } else {
                None
            },
            rng: SmallRng::seed_from_u64(sim.seed),
        }
    }

    #[inline]
    fn factor(&mut self) -> f32 {
        let noise = match &self.normal {
            Some(n) => self.rng.sample(*n),
            None => 0.0,
        };
        1.0 + self.bias + noise
    }
}

struct SimState {
    maze: SimMaze,
    /// Continuous pose: millimeters, radians CCW from +x (East)
    x_mm: f32,
    y_mm: f32,
    theta: f32,
    /// Command applied during the next sim step
    pending: (i16, i16),
    counts_per_mm: f32,
    wheel_base_mm: f32,
    max_wheel_speed_mm_s: f32,
    step_s: f32,
    slip: SlipModel,
    left_decoder: QuadratureDecoder,
    right_decoder: QuadratureDecoder,
    /// Quadrature phase index per wheel, 0..4
    left_phase: u8,
    right_phase: u8,
    /// Fractional tick carry per wheel
    left_frac: f32,
    right_frac: f32,
}

/// Phase sequence walked forward for forward wheel motion; each step is one
/// valid transition in the decoder table.
const PHASE_STATES: [(bool, bool); 4] = [(false, false), (true, false), (true, true), (false, true)];

impl SimState {
    /// Apply the pending command for one sim step, then latch the new one.
    fn command(&mut self, left: i16, right: i16) {
        let (pl, pr) = self.pending;
        let scale = self.max_wheel_speed_mm_s * self.step_s / 255.0;
        let left_mm = pl.clamp(-255, 255) as f32 * scale * self.slip.factor();
        let right_mm = pr.clamp(-255, 255) as f32 * scale * self.slip.factor();
        self.integrate(left_mm, right_mm);
        self.tick_encoders(left_mm, right_mm);
        self.pending = (left, right);
    }

    /// Differential-drive pose update for per-wheel travel distances.
    fn integrate(&mut self, left_mm: f32, right_mm: f32) {
        let linear = (left_mm + right_mm) / 2.0;
        let dtheta = (right_mm - left_mm) / self.wheel_base_mm;
        if dtheta.abs() < 1e-9 {
            self.x_mm += linear * self.theta.cos();
            self.y_mm += linear * self.theta.sin();
        } else {
            let r = linear / dtheta;
            let next_theta = self.theta + dtheta;
            self.x_mm += r * (next_theta.sin() - self.theta.sin());
            self.y_mm += r * (self.theta.cos() - next_theta.cos());
            self.theta = normalize_angle(next_theta);
        }
    }

    /// Convert wheel travel to whole ticks and walk real quadrature edges
    /// through the decoders. Counts are never written directly.
    fn tick_encoders(&mut self, left_mm: f32, right_mm: f32) {
        self.left_frac += left_mm * self.counts_per_mm;
        self.right_frac += right_mm * self.counts_per_mm;

        let left_whole = self.left_frac.trunc() as i32;
        let right_whole = self.right_frac.trunc() as i32;
        self.left_frac -= left_whole as f32;
        self.right_frac -= right_whole as f32;

        emit_edges(&mut self.left_decoder, &mut self.left_phase, left_whole);
        emit_edges(&mut self.right_decoder, &mut self.right_phase, right_whole);
    }

    /// Heading snapped to the nearest cardinal axis
    fn cardinal(&self) -> Direction {
        let quadrant = (self.theta / FRAC_PI_2).round() as i32;
        match quadrant.rem_euclid(4) {
            0 => Direction::East,
            1 => Direction::North,
            2 => Direction::West,
            _ => Direction::South,
        }
    }

    /// Distance from the robot to the nearest true wall along a cardinal axis
    fn raycast(&self, dir: Direction) -> f32 {
        let cell = self.maze.cell_mm;
        let mut cx = (self.x_mm / cell).floor() as i32;
        let mut cy = (self.y_mm / cell).floor() as i32;
        loop {
            if self.maze.has_wall(cx, cy, dir) {
                let d = match dir {
                    Direction::North => (cy + 1) as f32 * cell - self.y_mm,
                    Direction::South => self.y_mm - cy as f32 * cell,
                    Direction::East => (cx + 1) as f32 * cell - self.x_mm,
                    Direction::West => self.x_mm - cx as f32 * cell,
                };
                return d.min(RANGE_MAX_MM);
            }
            let (dx, dy) = dir.offset();
            cx += dx;
            cy += dy;
            // Wall planes recede one cell at a time; stop past sensor range
            if (cx.abs() + cy.abs()) as f32 * cell > 2.0 * RANGE_MAX_MM {
                return RANGE_MAX_MM;
            }
        }
    }
}

fn emit_edges(decoder: &mut QuadratureDecoder, phase: &mut u8, ticks: i32) {
    for _ in 0..ticks.abs() {
        *phase = if ticks > 0 {
            (*phase + 1) % 4
        } else {
            (*phase + 3) % 4
        };
        let (a, b) = PHASE_STATES[*phase as usize];
        decoder.on_edge(a, b);
    }
}

#[inline]
fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle % TAU;
    if a > PI {
        a -= TAU;
    } else if a < -PI {
        a += TAU;
    }
    a
}

/// Simulated robot in a maze; hands out paired device halves.
pub struct MazeSimulator {
    state: Arc<Mutex<SimState>>,
}

impl MazeSimulator {
    /// Place the robot at the center of `start`, facing `heading`.
    pub fn new(
        maze: SimMaze,
        robot: &RobotConfig,
        sim: &SimConfig,
        counters: &EncoderCounters,
        start: CellCoord,
        heading: Direction,
    ) -> Self {
        let cell = maze.cell_mm;
        let theta = match heading {
            Direction::East => 0.0,
            Direction::North => FRAC_PI_2,
            Direction::West => PI,
            Direction::South => -FRAC_PI_2,
        };
        debug!(
            "Simulator start: cell ({}, {}) facing {}, {}x{} maze",
            start.x,
            start.y,
            heading,
            maze.cols(),
            maze.rows()
        );
        let state = SimState {
            x_mm: (start.x as f32 + 0.5) * cell,
            y_mm: (start.y as f32 + 0.5) * cell,
            theta,
            maze,
            pending: (0, 0),
            counts_per_mm: robot.counts_per_mm(),
            wheel_base_mm: robot.wheel_base_mm,
            max_wheel_speed_mm_s: sim.max_wheel_speed_mm_s,
            step_s: sim.step_s,
            slip: SlipModel::new(sim),
            left_decoder: counters.decoder(Wheel::Left),
            right_decoder: counters.decoder(Wheel::Right),
            left_phase: 0,
            right_phase: 0,
            left_frac: 0.0,
            right_frac: 0.0,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// The motor and sensor halves sharing this simulation.
    pub fn split(&self) -> (SimMotors, SimRanges) {
        (
            SimMotors {
                state: Arc::clone(&self.state),
            },
            SimRanges {
                state: Arc::clone(&self.state),
            },
        )
    }

    /// Continuous pose (x mm, y mm, theta) for assertions
    pub fn pose_mm(&self) -> (f32, f32, f32) {
        let s = self.state.lock().unwrap();
        (s.x_mm, s.y_mm, s.theta)
    }

    /// Cell the robot currently occupies
    pub fn cell(&self) -> CellCoord {
        let s = self.state.lock().unwrap();
        let cell = s.maze.cell_mm;
        CellCoord::new((s.x_mm / cell).floor() as i32, (s.y_mm / cell).floor() as i32)
    }

    /// Cardinal the robot is closest to facing
    pub fn heading(&self) -> Direction {
        self.state.lock().unwrap().cardinal()
    }
}

/// Motor half of the simulator. Sim time advances on every command: the
/// previously latched command is applied for one step, then the new one is
/// latched. Commands therefore take effect with one step of latency, like a
/// real drive stage.
pub struct SimMotors {
    state: Arc<Mutex<SimState>>,
}

impl MotorDriver for SimMotors {
    fn set_motors(&mut self, left: i16, right: i16) -> Result<()> {
        self.state.lock().unwrap().command(left, right);
        Ok(())
    }
}

/// Sensor half of the simulator. Reading does not advance sim time.
pub struct SimRanges {
    state: Arc<Mutex<SimState>>,
}

impl RangeSensors for SimRanges {
    fn read(&mut self) -> Result<DistanceReading> {
        let s = self.state.lock().unwrap();
        let heading = s.cardinal();
        Ok(DistanceReading::new(
            s.raycast(heading.left()),
            s.raycast(heading),
            s.raycast(heading.right()),
        ))
    }
}
