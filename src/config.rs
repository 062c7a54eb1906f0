//! Configuration loading for VyuhaNav

use crate::error::{Result, VyuhaError};
use serde::Deserialize;
use std::f32::consts::PI;
use std::path::Path;

/// Main configuration structure
#[derive(Clone, Debug, Deserialize)]
pub struct VyuhaConfig {
    #[serde(default)]
    pub maze: MazeConfig,
    #[serde(default)]
    pub robot: RobotConfig,
    #[serde(default)]
    pub pid: PidConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub sim: SimConfig,
}

/// Maze grid geometry
#[derive(Clone, Debug, Deserialize)]
pub struct MazeConfig {
    /// Number of cell rows (default: 16)
    #[serde(default = "default_maze_rows")]
    pub rows: i32,

    /// Number of cell columns (default: 16)
    #[serde(default = "default_maze_cols")]
    pub cols: i32,

    /// Start cell [x, y] (default: [0, 0])
    #[serde(default = "default_start")]
    pub start: [i32; 2],

    /// Goal cell [x, y] (default: [8, 8])
    #[serde(default = "default_goal")]
    pub goal: [i32; 2],

    /// Cell pitch in millimeters (default: 180)
    #[serde(default = "default_cell_size")]
    pub cell_size_mm: f32,
}

/// Robot physical parameters, used to derive encoder geometry
#[derive(Clone, Debug, Deserialize)]
pub struct RobotConfig {
    /// Encoder pulses per motor revolution (default: 7)
    #[serde(default = "default_encoder_ppr")]
    pub encoder_ppr: u32,

    /// Gearbox reduction ratio (default: 82)
    #[serde(default = "default_gear_ratio")]
    pub gear_ratio: f32,

    /// Wheel diameter in millimeters (default: 40)
    #[serde(default = "default_wheel_diameter")]
    pub wheel_diameter_mm: f32,

    /// Distance between wheel centers in millimeters (default: 90)
    #[serde(default = "default_wheel_base")]
    pub wheel_base_mm: f32,
}

/// Wall-following PID parameters
#[derive(Clone, Debug, Deserialize)]
pub struct PidConfig {
    /// Proportional gain (default: 1.4)
    #[serde(default = "default_kp")]
    pub kp: f32,

    /// Integral gain (default: 0.08)
    #[serde(default = "default_ki")]
    pub ki: f32,

    /// Derivative gain (default: 1.1)
    #[serde(default = "default_kd")]
    pub kd: f32,

    /// Error band treated as zero, in millimeters (default: 10)
    #[serde(default = "default_dead_zone")]
    pub dead_zone_mm: f32,

    /// Anti-windup clamp on the integral accumulator (default: 100)
    #[serde(default = "default_integral_limit")]
    pub integral_limit: f32,
}

/// Speed and distance thresholds for driving
#[derive(Clone, Debug, Deserialize)]
pub struct DriveConfig {
    /// Cruise command while wall following (default: 140)
    #[serde(default = "default_base_speed")]
    pub base_speed: i16,

    /// Lower clamp on issued commands (default: 60)
    #[serde(default = "default_min_speed")]
    pub min_speed: i16,

    /// Upper clamp on issued commands (default: 255)
    #[serde(default = "default_max_speed")]
    pub max_speed: i16,

    /// Wheel command during in-place turns (default: 80)
    #[serde(default = "default_turn_speed")]
    pub turn_speed: i16,

    /// Target standoff from a single wall in millimeters (default: 55)
    #[serde(default = "default_wall_follow_distance")]
    pub wall_follow_distance_mm: f32,

    /// Side distance above which the corridor counts as open (default: 130)
    #[serde(default = "default_opening_threshold")]
    pub opening_threshold_mm: f32,

    /// Front distance below which speeds taper off (default: 130)
    #[serde(default = "default_front_wall_threshold")]
    pub front_wall_threshold_mm: f32,

    /// Front distance where the taper bottoms out (default: 50)
    #[serde(default = "default_slowdown_near")]
    pub slowdown_near_mm: f32,

    /// Speed factor at the near end of the taper (default: 0.3)
    #[serde(default = "default_slowdown_min_factor")]
    pub slowdown_min_factor: f32,

    /// Speed factor at the far end of the taper (default: 0.8)
    #[serde(default = "default_slowdown_max_factor")]
    pub slowdown_max_factor: f32,

    /// Front distance that aborts a forward move, in millimeters (default: 25)
    #[serde(default = "default_emergency_distance")]
    pub emergency_distance_mm: f32,
}

/// Motion primitive calibration
#[derive(Clone, Debug, Deserialize)]
pub struct MotionConfig {
    /// Overshoot margin on forward tick targets (default: 1.02)
    #[serde(default = "default_forward_margin")]
    pub forward_margin: f32,

    /// Overshoot margin on 90 degree turns (default: 1.12)
    #[serde(default = "default_turn90_margin")]
    pub turn90_margin: f32,

    /// Overshoot margin on 180 degree turns (default: 1.25)
    #[serde(default = "default_turn180_margin")]
    pub turn180_margin: f32,

    /// Straightening reverse pulse after a 180, in seconds (default: 0.4)
    #[serde(default = "default_reverse_pulse")]
    pub reverse_pulse_s: f32,

    /// Control loop period in milliseconds (default: 10)
    #[serde(default = "default_control_period")]
    pub control_period_ms: u64,

    /// Accumulated tick time before a primitive aborts as stalled (default: 10)
    #[serde(default = "default_stall_timeout")]
    pub stall_timeout_s: f32,
}

/// Decision loop thresholds
#[derive(Clone, Debug, Deserialize)]
pub struct NavigationConfig {
    /// Scan distance below which a wall is recorded, in millimeters (default: 130)
    #[serde(default = "default_wall_scan_threshold")]
    pub wall_scan_threshold_mm: f32,

    /// Consecutive stuck steps before the run fails (default: 3)
    #[serde(default = "default_max_consecutive_stuck")]
    pub max_consecutive_stuck: u32,

    /// Consecutive aborted moves before the run fails (default: 3)
    #[serde(default = "default_max_consecutive_aborts")]
    pub max_consecutive_aborts: u32,
}

/// Simulator backend settings
#[derive(Clone, Debug, Deserialize)]
pub struct SimConfig {
    /// Wheel ground speed at full command, in mm/s (default: 500)
    #[serde(default = "default_max_wheel_speed")]
    pub max_wheel_speed_mm_s: f32,

    /// Simulated time per motor command, in seconds (default: 0.002)
    #[serde(default = "default_sim_step")]
    pub step_s: f32,

    /// Constant per-wheel slip factor offset (default: 0)
    #[serde(default)]
    pub slip_bias: f32,

    /// Gaussian slip standard deviation, 0 disables noise (default: 0)
    #[serde(default)]
    pub slip_stddev: f32,

    /// RNG seed for the slip model (default: 42)
    #[serde(default = "default_sim_seed")]
    pub seed: u64,

    /// Optional maze text file; boundary-only maze when absent
    #[serde(default)]
    pub maze_file: Option<String>,
}

impl RobotConfig {
    /// Encoder counts per wheel revolution (4 edges per pulse, through the gearbox)
    pub fn counts_per_rev(&self) -> f32 {
        4.0 * self.encoder_ppr as f32 * self.gear_ratio
    }

    /// Encoder counts per millimeter of wheel travel
    pub fn counts_per_mm(&self) -> f32 {
        self.counts_per_rev() / (PI * self.wheel_diameter_mm)
    }

    /// Per-wheel counts for an in-place 90 degree rotation
    pub fn counts_per_90deg(&self) -> f32 {
        (PI * self.wheel_base_mm / 4.0) * self.counts_per_mm()
    }
}

impl VyuhaConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VyuhaError::Config(format!("Failed to read config file: {}", e)))?;
        let config: VyuhaConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for VyuhaConfig {
    fn default() -> Self {
        Self {
            maze: MazeConfig::default(),
            robot: RobotConfig::default(),
            pid: PidConfig::default(),
            drive: DriveConfig::default(),
            motion: MotionConfig::default(),
            navigation: NavigationConfig::default(),
            sim: SimConfig::default(),
        }
    }
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            rows: default_maze_rows(),
            cols: default_maze_cols(),
            start: default_start(),
            goal: default_goal(),
            cell_size_mm: default_cell_size(),
        }
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            encoder_ppr: default_encoder_ppr(),
            gear_ratio: default_gear_ratio(),
            wheel_diameter_mm: default_wheel_diameter(),
            wheel_base_mm: default_wheel_base(),
        }
    }
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: default_kp(),
            ki: default_ki(),
            kd: default_kd(),
            dead_zone_mm: default_dead_zone(),
            integral_limit: default_integral_limit(),
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            base_speed: default_base_speed(),
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
            turn_speed: default_turn_speed(),
            wall_follow_distance_mm: default_wall_follow_distance(),
            opening_threshold_mm: default_opening_threshold(),
            front_wall_threshold_mm: default_front_wall_threshold(),
            slowdown_near_mm: default_slowdown_near(),
            slowdown_min_factor: default_slowdown_min_factor(),
            slowdown_max_factor: default_slowdown_max_factor(),
            emergency_distance_mm: default_emergency_distance(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            forward_margin: default_forward_margin(),
            turn90_margin: default_turn90_margin(),
            turn180_margin: default_turn180_margin(),
            reverse_pulse_s: default_reverse_pulse(),
            control_period_ms: default_control_period(),
            stall_timeout_s: default_stall_timeout(),
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            wall_scan_threshold_mm: default_wall_scan_threshold(),
            max_consecutive_stuck: default_max_consecutive_stuck(),
            max_consecutive_aborts: default_max_consecutive_aborts(),
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_wheel_speed_mm_s: default_max_wheel_speed(),
            step_s: default_sim_step(),
            slip_bias: 0.0,
            slip_stddev: 0.0,
            seed: default_sim_seed(),
            maze_file: None,
        }
    }
}

// Default value functions
fn default_maze_rows() -> i32 {
    16
}
fn default_maze_cols() -> i32 {
    16
}
fn default_start() -> [i32; 2] {
    [0, 0]
}
fn default_goal() -> [i32; 2] {
    [8, 8]
}
fn default_cell_size() -> f32 {
    180.0
}
fn default_encoder_ppr() -> u32 {
    7
}
fn default_gear_ratio() -> f32 {
    82.0
}
fn default_wheel_diameter() -> f32 {
    40.0
}
fn default_wheel_base() -> f32 {
    90.0
}
fn default_kp() -> f32 {
    1.4
}
fn default_ki() -> f32 {
    0.08
}
fn default_kd() -> f32 {
    1.1
}
fn default_dead_zone() -> f32 {
    10.0
}
fn default_integral_limit() -> f32 {
    100.0
}
fn default_base_speed() -> i16 {
    140
}
fn default_min_speed() -> i16 {
    60
}
fn default_max_speed() -> i16 {
    255
}
fn default_turn_speed() -> i16 {
    80
}
fn default_wall_follow_distance() -> f32 {
    55.0
}
fn default_opening_threshold() -> f32 {
    130.0
}
fn default_front_wall_threshold() -> f32 {
    130.0
}
fn default_slowdown_near() -> f32 {
    50.0
}
fn default_slowdown_min_factor() -> f32 {
    0.3
}
fn default_slowdown_max_factor() -> f32 {
    0.8
}
fn default_emergency_distance() -> f32 {
    25.0
}
fn default_forward_margin() -> f32 {
    1.02
}
fn default_turn90_margin() -> f32 {
    1.12
}
fn default_turn180_margin() -> f32 {
    1.25
}
fn default_reverse_pulse() -> f32 {
    0.4
}
fn default_control_period() -> u64 {
    10
}
fn default_stall_timeout() -> f32 {
    10.0
}
fn default_wall_scan_threshold() -> f32 {
    130.0
}
fn default_max_consecutive_stuck() -> u32 {
    3
}
fn default_max_consecutive_aborts() -> u32 {
    3
}
fn default_max_wheel_speed() -> f32 {
    500.0
}
fn default_sim_step() -> f32 {
    0.002
}
fn default_sim_seed() -> u64 {
    42
}
