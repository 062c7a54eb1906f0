//! End-to-end maze runs against the simulator backend.
//!
//! These tests wire the real decoder, PID follower, motion executor, and
//! navigator to the deterministic simulator and drive whole exploration runs.

use vyuha_nav::config::VyuhaConfig;
use vyuha_nav::control::{MotionExecutor, WallFollower};
use vyuha_nav::devices::{MazeSimulator, SimMaze, SimMotors, SimRanges};
use vyuha_nav::encoder::EncoderCounters;
use vyuha_nav::maze::{CellCoord, Direction, MazeMap, DIRECTIONS};
use vyuha_nav::navigation::{Navigator, StepOutcome};

/// Config tuned for the slip-free simulator: exact tick targets, no pacing
/// sleeps, no backlash pulse.
fn sim_config(cols: i32, rows: i32, goal: (i32, i32)) -> VyuhaConfig {
    let mut config = VyuhaConfig::default();
    config.maze.cols = cols;
    config.maze.rows = rows;
    config.maze.start = [0, 0];
    config.maze.goal = [goal.0, goal.1];
    config.motion.forward_margin = 1.0;
    config.motion.turn90_margin = 1.0;
    config.motion.turn180_margin = 1.0;
    config.motion.reverse_pulse_s = 0.0;
    config.motion.control_period_ms = 0;
    config
}

fn build_navigator(
    config: &VyuhaConfig,
    true_maze: SimMaze,
) -> (Navigator<SimMotors, SimRanges>, MazeSimulator) {
    let map = MazeMap::from_config(&config.maze);
    let start = map.start();
    let counters = EncoderCounters::new();
    let sim = MazeSimulator::new(
        true_maze,
        &config.robot,
        &config.sim,
        &counters,
        CellCoord::new(start.x, start.y),
        Direction::North,
    );
    let (motors, sensors) = sim.split();
    let executor = MotionExecutor::new(
        motors,
        sensors,
        counters,
        WallFollower::new(config.pid.clone(), config.drive.clone()),
        &config.robot,
        config.drive.clone(),
        config.motion.clone(),
    );
    let navigator = Navigator::new(
        map,
        executor,
        config.navigation.clone(),
        config.maze.cell_size_mm,
    );
    (navigator, sim)
}

fn assert_wall_symmetry(map: &MazeMap) {
    for y in 0..map.rows() {
        for x in 0..map.cols() {
            for dir in DIRECTIONS {
                let n = CellCoord::new(x, y).step(dir);
                if map.in_bounds(n.x, n.y) {
                    assert_eq!(
                        map.has_wall(x, y, dir),
                        map.has_wall(n.x, n.y, dir.opposite()),
                        "wall mismatch at ({}, {}) {}",
                        x,
                        y,
                        dir
                    );
                }
            }
        }
    }
}

// --- Scenario: empty 16x16 maze ---

#[test]
fn empty_maze_first_replan_matches_manhattan() {
    let config = sim_config(16, 16, (8, 8));
    let cell = config.maze.cell_size_mm;
    let (mut nav, sim) = build_navigator(&config, SimMaze::open(16, 16, cell));

    let report = nav.step().unwrap();
    assert_eq!(report.outcome, StepOutcome::Moved);

    // No internal walls discovered: the BFS field is exactly Manhattan
    for y in 0..16 {
        for x in 0..16 {
            let expected = ((x - 8i32).abs() + (y - 8i32).abs()) as u16;
            assert_eq!(nav.map().flood_at(x, y), expected, "cell ({}, {})", x, y);
        }
    }

    // North and East tie at flood 15; scan order picks North
    assert_eq!(nav.pose().cell, CellCoord::new(0, 1));
    assert_eq!(nav.pose().heading, Direction::North);
    assert_eq!(sim.cell(), CellCoord::new(0, 1));
}

// --- Scenario: wall directly ahead of the start ---

#[test]
fn wall_ahead_of_start_forces_detour() {
    let config = sim_config(4, 4, (3, 3));
    let cell = config.maze.cell_size_mm;
    let mut true_maze = SimMaze::open(4, 4, cell);
    true_maze.set_wall(0, 0, Direction::North, true);
    let (mut nav, sim) = build_navigator(&config, true_maze);

    let report = nav.step().unwrap();
    assert_eq!(report.outcome, StepOutcome::Moved);
    let scan = report.scan.unwrap();
    assert!(scan.front);

    // The scanned wall overrides the optimistic field: East, not North
    assert!(nav.map().has_wall(0, 0, Direction::North));
    assert_eq!(nav.pose().cell, CellCoord::new(1, 0));
    assert_eq!(nav.pose().heading, Direction::East);
    assert_eq!(sim.cell(), CellCoord::new(1, 0));
    assert_eq!(sim.heading(), Direction::East);
}

// --- Full exploration runs ---

const WALLED_6X6: &str = "\
+---+---+---+---+---+---+
|                       |
+   +   +   +   +   +   +
|                       |
+   +   +   +   +   +   +
|           G           |
+   +   +---+---+   +   +
|   |                   |
+   +   +   +   +   +   +
|   |                   |
+   +   +   +   +   +   +
| S                     |
+---+---+---+---+---+---+";

#[test]
fn walled_maze_run_reaches_goal() {
    let config = sim_config(6, 6, (3, 3));
    let true_maze = SimMaze::parse(WALLED_6X6, config.maze.cell_size_mm).unwrap();
    let (mut nav, sim) = build_navigator(&config, true_maze);

    let outcome = nav.run().unwrap();
    assert_eq!(outcome, StepOutcome::GoalReached);
    assert_eq!(nav.pose().cell, CellCoord::new(3, 3));
    assert_eq!(sim.cell(), CellCoord::new(3, 3));

    // Repeating the terminal step changes nothing
    let report = nav.step().unwrap();
    assert_eq!(report.outcome, StepOutcome::GoalReached);
    assert_eq!(report.pose.cell, CellCoord::new(3, 3));

    // The walls shielding the goal from the south were discovered en route
    assert!(nav.map().is_visited(0, 0));
    assert_eq!(nav.map().flood_at(3, 3), 0);
    assert_wall_symmetry(nav.map());
}

#[test]
fn open_maze_run_walks_straight_distances() {
    let config = sim_config(8, 8, (4, 4));
    let cell = config.maze.cell_size_mm;
    let (mut nav, sim) = build_navigator(&config, SimMaze::open(8, 8, cell));

    let outcome = nav.run().unwrap();
    assert_eq!(outcome, StepOutcome::GoalReached);
    assert_eq!(nav.pose().cell, CellCoord::new(4, 4));

    // Eight moves for a Manhattan distance of eight: no detours happened
    assert_eq!(nav.map().visited_count(), 8);

    // The robot physically sits inside the goal cell
    let (x, y, _) = sim.pose_mm();
    assert!(x > 4.0 * cell && x < 5.0 * cell, "x = {}", x);
    assert!(y > 4.0 * cell && y < 5.0 * cell, "y = {}", y);
}

// --- Shipped demo artifacts ---

#[test]
fn demo_config_and_maze_reach_goal() {
    let mut config = VyuhaConfig::load(std::path::Path::new("vyuha.toml")).unwrap();
    assert_eq!(config.maze.cols, 6);
    let maze_file = config.sim.maze_file.clone().unwrap();
    // Skip the demo's real-time pacing in the test run
    config.motion.control_period_ms = 0;

    let true_maze =
        SimMaze::load(std::path::Path::new(&maze_file), config.maze.cell_size_mm).unwrap();
    let (mut nav, _sim) = build_navigator(&config, true_maze);

    assert_eq!(nav.run().unwrap(), StepOutcome::GoalReached);
    assert_eq!(nav.pose().cell, CellCoord::new(3, 3));
}
