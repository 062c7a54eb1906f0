//! PID wall-following controller.
//!
//! One PID state steers every corridor variant: centered between two walls,
//! standoff from a single wall, or straight through an opening. Each tick
//! converts a range reading into a differential correction and issues the
//! resulting wheel commands.

use tracing::trace;

use crate::config::{DriveConfig, PidConfig};
use crate::devices::{DistanceReading, MotorDriver, WheelSpeeds};
use crate::error::Result;

/// Which steering variant a tick resolved to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Corridor {
    Centered,
    LeftWall,
    RightWall,
    Open,
}

/// Wall-following steering with shared PID state.
///
/// The integral and previous error persist across variant switches; only
/// [`reset`](Self::reset), openings, and the dead zone clear them.
pub struct WallFollower {
    pid: PidConfig,
    drive: DriveConfig,
    integral: f32,
    prev_error: f32,
}

impl WallFollower {
    pub fn new(pid: PidConfig, drive: DriveConfig) -> Self {
        Self {
            pid,
            drive,
            integral: 0.0,
            prev_error: 0.0,
        }
    }

    /// Clear the accumulated state. Called at the start of every primitive.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
    }

    /// One control tick: classify the corridor, run the PID, issue wheel
    /// commands. `dt` is floored to 1 ms.
    pub fn tick(
        &mut self,
        reading: &DistanceReading,
        dt: f32,
        motors: &mut impl MotorDriver,
    ) -> Result<WheelSpeeds> {
        let dt = dt.max(0.001);
        let open = self.drive.opening_threshold_mm;
        let base = self.drive.base_speed as f32;

        let left_walled = reading.left < open;
        let right_walled = reading.right < open;

        let (corridor, mut error) = match (left_walled, right_walled) {
            (true, true) => (Corridor::Centered, reading.left - reading.right),
            (true, false) => (
                Corridor::LeftWall,
                reading.left - self.drive.wall_follow_distance_mm,
            ),
            (false, true) => (
                Corridor::RightWall,
                reading.right - self.drive.wall_follow_distance_mm,
            ),
            (false, false) => (Corridor::Open, 0.0),
        };

        if corridor == Corridor::Open {
            // No wall to hold: straight ahead at cruise, nothing to integrate
            self.integral = 0.0;
            let speeds = WheelSpeeds::new(self.drive.base_speed, self.drive.base_speed);
            motors.set_motors(speeds.left, speeds.right)?;
            return Ok(speeds);
        }

        // Dead zone suppresses noise chatter around the setpoint
        if error.abs() < self.pid.dead_zone_mm {
            error = 0.0;
            self.integral = 0.0;
        }

        self.integral = (self.integral + error * dt)
            .clamp(-self.pid.integral_limit, self.pid.integral_limit);
        let derivative = (error - self.prev_error) / dt;
        self.prev_error = error;

        let raw =
            self.pid.kp * error + self.pid.ki * self.integral + self.pid.kd * derivative;

        // Right-wall following mirrors the correction sign
        let (mut left, mut right) = match corridor {
            Corridor::RightWall => (base + raw, base - raw),
            _ => (base - raw, base + raw),
        };

        let factor = self.slowdown_factor(reading.center);
        left *= factor;
        right *= factor;

        let min = self.drive.min_speed as f32;
        let max = self.drive.max_speed as f32;
        let speeds = WheelSpeeds::new(
            left.clamp(min, max).round() as i16,
            right.clamp(min, max).round() as i16,
        );

        trace!(
            "pid tick: {:?} err={:.1} i={:.1} d={:.1} raw={:.1} factor={:.2} -> ({}, {})",
            corridor,
            error,
            self.integral,
            derivative,
            raw,
            factor,
            speeds.left,
            speeds.right
        );

        motors.set_motors(speeds.left, speeds.right)?;
        Ok(speeds)
    }

    /// Linear speed taper as the front wall closes in: `max_factor` at the
    /// front threshold down to `min_factor` at the near distance.
    fn slowdown_factor(&self, center_mm: f32) -> f32 {
        if center_mm >= self.drive.front_wall_threshold_mm {
            return 1.0;
        }
        let near = self.drive.slowdown_near_mm;
        let far = self.drive.front_wall_threshold_mm;
        let t = ((center_mm - near) / (far - near)).clamp(0.0, 1.0);
        self.drive.slowdown_min_factor
            + t * (self.drive.slowdown_max_factor - self.drive.slowdown_min_factor)
    }
}
