//! VyuhaNav - maze run demo against the built-in simulator
//!
//! Loads a configuration (and optionally a maze text file), places the
//! simulated robot at the start cell, and runs the navigation loop until it
//! reaches the goal or fails.

use std::path::Path;
use std::process::ExitCode;

use tracing::{error, info};

use vyuha_nav::config::VyuhaConfig;
use vyuha_nav::control::{MotionExecutor, WallFollower};
use vyuha_nav::devices::{MazeSimulator, SimMaze};
use vyuha_nav::encoder::EncoderCounters;
use vyuha_nav::error::Result;
use vyuha_nav::maze::{CellCoord, Direction, MazeMap};
use vyuha_nav::navigation::{Navigator, StepOutcome};

/// Parse config path from command line arguments.
///
/// Supports `vyuha-nav <path>`, `vyuha-nav --config <path>`, and
/// `vyuha-nav -c <path>`; falls back to `vyuha.toml` when present.
fn parse_config_path() -> Option<String> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Usage: vyuha-nav [--config <path>]");
        println!();
        println!("Runs the maze navigator against the built-in simulator.");
        println!("Without a config file, a boundary-only 16x16 maze is used.");
        std::process::exit(0);
    }

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    if args.len() > 1 && !args[1].starts_with('-') {
        return Some(args[1].clone());
    }
    if Path::new("vyuha.toml").exists() {
        return Some("vyuha.toml".to_string());
    }
    None
}

fn run(config: &VyuhaConfig) -> Result<StepOutcome> {
    let map = MazeMap::from_config(&config.maze);
    let start = map.start();

    let true_maze = match &config.sim.maze_file {
        Some(path) => {
            info!("Loading maze from {}", path);
            SimMaze::load(Path::new(path), config.maze.cell_size_mm)?
        }
        None => {
            info!(
                "No maze file configured, using open {}x{} maze",
                config.maze.cols, config.maze.rows
            );
            SimMaze::open(config.maze.cols, config.maze.rows, config.maze.cell_size_mm)
        }
    };

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
    let mut navigator = Navigator::new(
        map,
        executor,
        config.navigation.clone(),
        config.maze.cell_size_mm,
    );

    let outcome = navigator.run()?;
    info!("run finished: {:?}", outcome);
    info!("discovered walls:\n{}", navigator.map().render_walls(Some(navigator.pose())));
    info!("flood field:\n{}", navigator.map().render_flood(Some(navigator.pose())));
    Ok(outcome)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vyuha_nav=info".parse().unwrap()),
        )
        .init();

    let config = match parse_config_path() {
        Some(path) => {
            info!("Loading configuration from {}", path);
            match VyuhaConfig::load(Path::new(&path)) {
                Ok(config) => config,
                Err(e) => {
                    error!("failed to load config: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        None => {
            info!("Using default configuration");
            VyuhaConfig::default()
        }
    };

    info!("VyuhaNav v{}", env!("CARGO_PKG_VERSION"));
    match run(&config) {
        Ok(StepOutcome::GoalReached) => ExitCode::SUCCESS,
        Ok(outcome) => {
            error!("navigation ended without reaching the goal: {:?}", outcome);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("navigation error: {}", e);
            ExitCode::FAILURE
        }
    }
}
