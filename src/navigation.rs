//! Top-level maze navigation loop.
//!
//! Each step scans the walls around the current cell, replans the flood
//! field, turns toward the best neighbor, and drives one cell. The loop owns
//! every piece of mutable state; nothing is global.

use tracing::{debug, info, warn};

use crate::config::NavigationConfig;
use crate::control::{AbortReason, MotionExecutor, Primitive, PrimitiveStatus};
use crate::devices::{MotorDriver, RangeSensors};
use crate::error::Result;
use crate::maze::{Direction, MazeMap, Pose};

/// What one decision step accomplished
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Turned as needed and advanced one cell
    Moved,
    /// Forward move aborted on an obstacle; pose unchanged
    Aborted,
    /// No accessible neighbor can reach the goal; pose unchanged
    Stuck,
    /// Pose reached the goal cell (terminal)
    GoalReached,
    /// Too many consecutive stuck/aborted steps, or a turn failed (terminal)
    Failed,
}

impl StepOutcome {
    pub fn is_terminal(self) -> bool {
        matches!(self, StepOutcome::GoalReached | StepOutcome::Failed)
    }
}

/// Wall classification of one scan, relative to the robot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WallScan {
    pub front: bool,
    pub right: bool,
    pub left: bool,
}

/// Observable record of one decision step
#[derive(Clone, Copy, Debug)]
pub struct StepReport {
    pub outcome: StepOutcome,
    pub pose: Pose,
    /// Flood value at the reported pose
    pub flood: u16,
    /// Scan taken this step; absent on terminal short-circuits
    pub scan: Option<WallScan>,
}

/// Owned-context navigation loop over a map and a motion executor.
pub struct Navigator<M: MotorDriver, R: RangeSensors> {
    map: MazeMap,
    executor: MotionExecutor<M, R>,
    pose: Pose,
    config: NavigationConfig,
    cell_mm: f32,
    stuck_streak: u32,
    abort_streak: u32,
    terminal: Option<StepOutcome>,
}

impl<M: MotorDriver, R: RangeSensors> Navigator<M, R> {
    /// Start at the map's start cell, facing North.
    pub fn new(
        map: MazeMap,
        executor: MotionExecutor<M, R>,
        config: NavigationConfig,
        cell_mm: f32,
    ) -> Self {
        let start = map.start();
        Self {
            map,
            executor,
            pose: Pose::new(start.x, start.y, Direction::North),
            config,
            cell_mm,
            stuck_streak: 0,
            abort_streak: 0,
            terminal: None,
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn map(&self) -> &MazeMap {
        &self.map
    }

    /// One full decision step: scan, replan, turn, move, update pose.
    pub fn step(&mut self) -> Result<StepReport> {
        if let Some(outcome) = self.terminal {
            return Ok(self.report(outcome, None));
        }

        let (x, y) = (self.pose.cell.x, self.pose.cell.y);
        self.map.mark_visited(x, y);

        let scan = self.scan_walls()?;
        self.map.update_flood();

        let Some(next) = self.map.next_direction(x, y) else {
            self.stuck_streak += 1;
            warn!(
                "stuck at ({}, {}): no accessible neighbor ({} in a row)",
                x, y, self.stuck_streak
            );
            if self.stuck_streak >= self.config.max_consecutive_stuck {
                return Ok(self.fail(Some(scan)));
            }
            return Ok(self.report(StepOutcome::Stuck, Some(scan)));
        };
        self.stuck_streak = 0;

        debug!(
            "at ({}, {}) facing {}: flood {}, heading {}",
            x,
            y,
            self.pose.heading,
            self.map.flood_at(x, y),
            next
        );

        if let Some(turn) = match self.pose.heading.quarter_turns_to(next) {
            1 => Some(Primitive::TurnRight90),
            2 => Some(Primitive::Turn180),
            3 => Some(Primitive::TurnLeft90),
            _ => None,
        } {
            if let PrimitiveStatus::Aborted(reason) = self.executor.execute(turn)? {
                warn!("{:?} aborted: {:?}", turn, reason);
                return Ok(self.fail(Some(scan)));
            }
        }
        self.pose.heading = next;

        match self.executor.execute(Primitive::Forward { mm: self.cell_mm })? {
            PrimitiveStatus::Aborted(AbortReason::FrontObstacle) => {
                // Pose stays on the cell the move started from; the next
                // step rescans and replans from there
                self.abort_streak += 1;
                if self.abort_streak >= self.config.max_consecutive_aborts {
                    return Ok(self.fail(Some(scan)));
                }
                Ok(self.report(StepOutcome::Aborted, Some(scan)))
            }
            PrimitiveStatus::Aborted(reason) => {
                warn!("forward aborted: {:?}", reason);
                Ok(self.fail(Some(scan)))
            }
            _ => {
                self.abort_streak = 0;
                self.pose.advance_clamped(self.map.cols(), self.map.rows());
                if self.pose.cell == self.map.goal() {
                    self.executor.motors_mut().stop()?;
                    self.terminal = Some(StepOutcome::GoalReached);
                    info!(
                        "goal reached at ({}, {}) after visiting {} cells",
                        self.pose.cell.x,
                        self.pose.cell.y,
                        self.map.visited_count()
                    );
                    Ok(self.report(StepOutcome::GoalReached, Some(scan)))
                } else {
                    Ok(self.report(StepOutcome::Moved, Some(scan)))
                }
            }
        }
    }

    /// Step until a terminal outcome and return it.
    pub fn run(&mut self) -> Result<StepOutcome> {
        loop {
            let report = self.step()?;
            info!(
                "step: {:?} at ({}, {}) facing {} flood {}",
                report.outcome,
                report.pose.cell.x,
                report.pose.cell.y,
                report.pose.heading,
                report.flood
            );
            if report.outcome.is_terminal() {
                return Ok(report.outcome);
            }
        }
    }

    /// Read the sensors once and record walls for the three scanned sides.
    fn scan_walls(&mut self) -> Result<WallScan> {
        let reading = self.executor.sensors_mut().read()?;
        let threshold = self.config.wall_scan_threshold_mm;
        let scan = WallScan {
            front: reading.is_wall_front(threshold),
            right: reading.is_wall_right(threshold),
            left: reading.is_wall_left(threshold),
        };
        let (x, y) = (self.pose.cell.x, self.pose.cell.y);
        let heading = self.pose.heading;
        self.map.set_wall(x, y, heading, scan.front);
        self.map.set_wall(x, y, heading.right(), scan.right);
        self.map.set_wall(x, y, heading.left(), scan.left);
        debug!(
            "scan at ({}, {}) facing {}: front={} right={} left={}",
            x, y, heading, scan.front, scan.right, scan.left
        );
        Ok(scan)
    }

    fn fail(&mut self, scan: Option<WallScan>) -> StepReport {
        // Leave the robot safe before going terminal
        if let Err(e) = self.executor.motors_mut().stop() {
            warn!("motor stop on failure: {}", e);
        }
        self.terminal = Some(StepOutcome::Failed);
        self.report(StepOutcome::Failed, scan)
    }

    fn report(&self, outcome: StepOutcome, scan: Option<WallScan>) -> StepReport {
        StepReport {
            outcome,
            pose: self.pose,
            flood: self.map.flood_at(self.pose.cell.x, self.pose.cell.y),
            scan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DriveConfig, MotionConfig, PidConfig, RobotConfig};
    use crate::control::WallFollower;
    use crate::devices::{DistanceReading, MockMotors, ScriptedRanges};
    use crate::encoder::EncoderCounters;
    use crate::maze::CellCoord;

    fn navigator(
        sensors: ScriptedRanges,
        map: MazeMap,
    ) -> (Navigator<MockMotors, ScriptedRanges>, MockMotors) {
        let motors = MockMotors::new();
        let drive = DriveConfig::default();
        let mut motion = MotionConfig::default();
        // Mock motors never tick the encoders: keep watchdog exits fast
        motion.stall_timeout_s = 0.02;
        motion.control_period_ms = 0;
        let executor = MotionExecutor::new(
            motors.clone(),
            sensors,
            EncoderCounters::new(),
            WallFollower::new(PidConfig::default(), drive.clone()),
            &RobotConfig::default(),
            drive,
            motion,
        );
        let nav = Navigator::new(map, executor, NavigationConfig::default(), 180.0);
        (nav, motors)
    }

    #[test]
    fn test_boxed_in_start_goes_stuck_then_failed() {
        // Walls on all three scanned sides; the fourth is the boundary
        let sensors = ScriptedRanges::constant(DistanceReading::new(50.0, 50.0, 50.0));
        let map = MazeMap::new(4, 4, CellCoord::new(0, 0), CellCoord::new(3, 3));
        let (mut nav, motors) = navigator(sensors, map);

        let first = nav.step().unwrap();
        assert_eq!(first.outcome, StepOutcome::Stuck);
        assert_eq!(first.pose.cell, CellCoord::new(0, 0));
        assert_eq!(
            first.scan,
            Some(WallScan {
                front: true,
                right: true,
                left: true
            })
        );

        assert_eq!(nav.step().unwrap().outcome, StepOutcome::Stuck);
        // Third identical stuck step trips the livelock guard
        assert_eq!(nav.step().unwrap().outcome, StepOutcome::Failed);
        assert!(motors.is_stopped());
        // Terminal state repeats without further side effects
        assert_eq!(nav.step().unwrap().outcome, StepOutcome::Failed);
    }

    #[test]
    fn test_scan_maps_relative_to_heading() {
        // Open front, walls left and right, robot facing North at (1, 1)
        let sensors = ScriptedRanges::constant(DistanceReading::new(60.0, 500.0, 60.0));
        let map = MazeMap::new(4, 4, CellCoord::new(1, 1), CellCoord::new(3, 3));
        let (mut nav, _motors) = navigator(sensors, map);

        // Stall watchdog fails the forward move, but the scan already landed
        let _ = nav.step().unwrap();
        assert!(nav.map().has_wall(1, 1, Direction::West));
        assert!(nav.map().has_wall(1, 1, Direction::East));
        assert!(!nav.map().has_wall(1, 1, Direction::North));
        // Mirrored onto neighbors
        assert!(nav.map().has_wall(0, 1, Direction::East));
        assert!(nav.map().has_wall(2, 1, Direction::West));
        assert!(nav.map().is_visited(1, 1));
    }

    #[test]
    fn test_emergency_abort_keeps_pose_then_fails() {
        // Open scans alternate with a sudden front obstacle mid-move: the
        // scan sees nothing, the forward primitive aborts on its first tick
        let far = DistanceReading::far();
        let emergency = DistanceReading::new(500.0, 20.0, 500.0);
        let sensors =
            ScriptedRanges::new([far, emergency, far, emergency, far, emergency]);
        let map = MazeMap::new(4, 4, CellCoord::new(0, 0), CellCoord::new(3, 3));
        let (mut nav, motors) = navigator(sensors, map);

        let first = nav.step().unwrap();
        assert_eq!(first.outcome, StepOutcome::Aborted);
        // Pose stays on the cell the move started from
        assert_eq!(first.pose.cell, CellCoord::new(0, 0));
        assert_eq!(first.pose.heading, Direction::North);
        assert!(motors.is_stopped());

        // The next step rescans and replans from the same cell
        let second = nav.step().unwrap();
        assert_eq!(second.outcome, StepOutcome::Aborted);
        assert_eq!(nav.pose().cell, CellCoord::new(0, 0));

        // Third consecutive abort trips the cap and ends the run
        let third = nav.step().unwrap();
        assert_eq!(third.outcome, StepOutcome::Failed);
        assert_eq!(nav.pose().cell, CellCoord::new(0, 0));
        assert!(motors.is_stopped());
    }

    #[test]
    fn test_turn_stall_fails_the_run() {
        // Open to the East only: the planner wants a right turn, which the
        // mock hardware can never complete
        let sensors = ScriptedRanges::constant(DistanceReading::new(50.0, 50.0, 500.0));
        let map = MazeMap::new(4, 4, CellCoord::new(0, 0), CellCoord::new(3, 3));
        let (mut nav, motors) = navigator(sensors, map);

        let report = nav.step().unwrap();
        assert_eq!(report.outcome, StepOutcome::Failed);
        assert!(motors.is_stopped());
    }
}
