//! Hardware capability traits and backends.
//!
//! The control stack only ever talks to [`MotorDriver`] and [`RangeSensors`].
//! Backends: [`mock`] for scripted unit tests, [`sim`] for full closed-loop
//! maze runs without hardware.

pub mod mock;
pub mod sim;

use crate::error::Result;

pub use mock::{MockMotors, ScriptedRanges};
pub use sim::{MazeSimulator, SimMaze, SimMotors, SimRanges};

/// Shortest side range the sensors resolve, in millimeters
pub const SIDE_MIN_MM: f32 = 30.0;
/// Shortest center range the sensors resolve, in millimeters
pub const CENTER_MIN_MM: f32 = 25.0;
/// Longest range; also the sentinel for invalid or out-of-band readings
pub const RANGE_MAX_MM: f32 = 2000.0;

/// Signed per-wheel drive command pair, each in [-255, 255]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WheelSpeeds {
    pub left: i16,
    pub right: i16,
}

impl WheelSpeeds {
    #[inline]
    pub fn new(left: i16, right: i16) -> Self {
        Self { left, right }
    }

    #[inline]
    pub fn zero() -> Self {
        Self { left: 0, right: 0 }
    }
}

/// One refresh of the three range sensors, in millimeters.
///
/// Values are clamped into each sensor's valid band at construction:
/// readings below the band floor clamp up to it, while non-finite or
/// beyond-range readings are coerced to [`RANGE_MAX_MM`] and read as
/// "no wall nearby". A wall closer than the floor therefore still reads as
/// the nearest resolvable distance, never as open space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceReading {
    pub left: f32,
    pub center: f32,
    pub right: f32,
}

impl DistanceReading {
    pub fn new(left: f32, center: f32, right: f32) -> Self {
        Self {
            left: coerce(left, SIDE_MIN_MM),
            center: coerce(center, CENTER_MIN_MM),
            right: coerce(right, SIDE_MIN_MM),
        }
    }

    /// Reading with every sensor at the far sentinel
    pub fn far() -> Self {
        Self {
            left: RANGE_MAX_MM,
            center: RANGE_MAX_MM,
            right: RANGE_MAX_MM,
        }
    }

    #[inline]
    pub fn is_wall_left(&self, threshold_mm: f32) -> bool {
        self.left < threshold_mm
    }

    #[inline]
    pub fn is_wall_front(&self, threshold_mm: f32) -> bool {
        self.center < threshold_mm
    }

    #[inline]
    pub fn is_wall_right(&self, threshold_mm: f32) -> bool {
        self.right < threshold_mm
    }
}

/// Clamp a raw range into its valid band. Too-close readings clamp up to
/// the band floor; non-finite or beyond-range readings read as far.
#[inline]
fn coerce(value_mm: f32, min_mm: f32) -> f32 {
    if value_mm.is_finite() && value_mm <= RANGE_MAX_MM {
        value_mm.max(min_mm)
    } else {
        RANGE_MAX_MM
    }
}

/// Differential drive output
pub trait MotorDriver: Send {
    /// Issue a signed drive command per wheel, each in [-255, 255].
    fn set_motors(&mut self, left: i16, right: i16) -> Result<()>;

    /// Stop both wheels.
    fn stop(&mut self) -> Result<()> {
        self.set_motors(0, 0)
    }
}

/// Left/center/right range sensing
pub trait RangeSensors: Send {
    /// Refresh and return all three distances, pre-clamped.
    fn read(&mut self) -> Result<DistanceReading>;
}
