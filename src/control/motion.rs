//! Motion primitive execution.
//!
//! Each primitive is a control episode terminated by an encoder-count target:
//! wall-followed forward moves and open-loop in-place turns. Primitives run
//! as begin/tick state machines so tests can drive them with synthetic time;
//! [`MotionExecutor::execute`] wraps that in a paced blocking loop.

use std::time::Instant;

use tracing::{debug, warn};

use super::pid::WallFollower;
use crate::config::{DriveConfig, MotionConfig, RobotConfig};
use crate::devices::{MotorDriver, RangeSensors};
use crate::encoder::EncoderCounters;
use crate::error::Result;

/// One atomic motion episode
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Primitive {
    /// Wall-followed straight move
    Forward { mm: f32 },
    /// Open-loop 90 degree counter-clockwise turn
    TurnLeft90,
    /// Open-loop 90 degree clockwise turn
    TurnRight90,
    /// Open-loop 180 degree turn plus a backlash-settling reverse pulse
    Turn180,
}

/// Why a primitive gave up
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbortReason {
    /// Front range at or inside the emergency distance during a forward move
    FrontObstacle,
    /// Primitive did not complete within the stall timeout
    Stalled,
}

/// Tick result of the active primitive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveStatus {
    Running,
    Completed,
    Aborted(AbortReason),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Driving,
    /// Fixed-duration backward pulse after a 180, tracking elapsed seconds
    ReversePulse(f32),
}

struct Active {
    primitive: Primitive,
    target_ticks: i64,
    elapsed_s: f32,
    phase: Phase,
}

/// Owns the drive hardware and realizes primitives against encoder targets.
///
/// Turns overshoot their geometric tick count on purpose: open-loop turns
/// systematically undershoot from wheel slip, so the configured margins
/// over-specify the target.
pub struct MotionExecutor<M: MotorDriver, R: RangeSensors> {
    motors: M,
    sensors: R,
    counters: EncoderCounters,
    follower: WallFollower,
    drive: DriveConfig,
    motion: MotionConfig,
    counts_per_mm: f32,
    counts_per_90deg: f32,
    active: Option<Active>,
}

impl<M: MotorDriver, R: RangeSensors> MotionExecutor<M, R> {
    pub fn new(
        motors: M,
        sensors: R,
        counters: EncoderCounters,
        follower: WallFollower,
        robot: &RobotConfig,
        drive: DriveConfig,
        motion: MotionConfig,
    ) -> Self {
        Self {
            motors,
            sensors,
            counters,
            follower,
            drive,
            motion,
            counts_per_mm: robot.counts_per_mm(),
            counts_per_90deg: robot.counts_per_90deg(),
            active: None,
        }
    }

    /// Sensor access for the decision loop's scan step
    pub fn sensors_mut(&mut self) -> &mut R {
        &mut self.sensors
    }

    /// Motor access for terminal stops outside a primitive
    pub fn motors_mut(&mut self) -> &mut M {
        &mut self.motors
    }

    /// Arm a primitive: fresh encoder and PID state, tick target computed
    /// from calibration.
    pub fn begin(&mut self, primitive: Primitive) {
        let target_ticks = match primitive {
            Primitive::Forward { mm } => {
                self.motion.forward_margin * mm * self.counts_per_mm
            }
            Primitive::TurnLeft90 | Primitive::TurnRight90 => {
                self.motion.turn90_margin * self.counts_per_90deg
            }
            Primitive::Turn180 => self.motion.turn180_margin * 2.0 * self.counts_per_90deg,
        } as i64;
        debug!("begin {:?}: target {} ticks", primitive, target_ticks);
        self.counters.reset();
        self.follower.reset();
        self.active = Some(Active {
            primitive,
            target_ticks,
            elapsed_s: 0.0,
            phase: Phase::Driving,
        });
    }

    /// One control iteration of the active primitive. Motors are stopped on
    /// every terminal status; with nothing active this is a no-op completion.
    pub fn tick(&mut self, dt: f32) -> Result<PrimitiveStatus> {
        let Some(mut active) = self.active.take() else {
            return Ok(PrimitiveStatus::Completed);
        };
        let dt = dt.max(0.001);
        active.elapsed_s += dt;

        if active.elapsed_s > self.motion.stall_timeout_s {
            warn!(
                "{:?} stalled at {} / {} ticks",
                active.primitive,
                self.counters.average(),
                active.target_ticks
            );
            self.motors.stop()?;
            return Ok(PrimitiveStatus::Aborted(AbortReason::Stalled));
        }

        let progress = self.counters.average();
        let turn = self.drive.turn_speed;
        let status = match (active.primitive, active.phase) {
            (Primitive::Forward { .. }, _) => {
                if progress >= active.target_ticks {
                    self.motors.stop()?;
                    PrimitiveStatus::Completed
                } else {
                    let reading = self.sensors.read()?;
                    if reading.center <= self.drive.emergency_distance_mm {
                        warn!(
                            "emergency stop: front {:.0}mm at {} / {} ticks",
                            reading.center, progress, active.target_ticks
                        );
                        self.motors.stop()?;
                        PrimitiveStatus::Aborted(AbortReason::FrontObstacle)
                    } else {
                        self.follower.tick(&reading, dt, &mut self.motors)?;
                        PrimitiveStatus::Running
                    }
                }
            }
            (_, Phase::ReversePulse(pulse_s)) => {
                if pulse_s >= self.motion.reverse_pulse_s {
                    self.motors.stop()?;
                    PrimitiveStatus::Completed
                } else {
                    active.phase = Phase::ReversePulse(pulse_s + dt);
                    self.motors.set_motors(-turn, -turn)?;
                    PrimitiveStatus::Running
                }
            }
            (turn_primitive, Phase::Driving) => {
                if progress >= active.target_ticks {
                    self.motors.stop()?;
                    if turn_primitive == Primitive::Turn180 && self.motion.reverse_pulse_s > 0.0
                    {
                        active.phase = Phase::ReversePulse(0.0);
                        PrimitiveStatus::Running
                    } else {
                        PrimitiveStatus::Completed
                    }
                } else {
                    // Left pair for left and 180 turns, mirrored for right
                    match turn_primitive {
                        Primitive::TurnRight90 => self.motors.set_motors(turn, -turn)?,
                        _ => self.motors.set_motors(-turn, turn)?,
                    }
                    PrimitiveStatus::Running
                }
            }
        };

        if status == PrimitiveStatus::Running {
            self.active = Some(active);
        }
        Ok(status)
    }

    /// Run a primitive to a terminal status, pacing ticks at the configured
    /// control period and measuring real elapsed time (floored to 1 ms).
    pub fn execute(&mut self, primitive: Primitive) -> Result<PrimitiveStatus> {
        self.begin(primitive);
        let mut last = Instant::now();
        loop {
            let dt = last.elapsed().as_secs_f32();
            last = Instant::now();
            match self.tick(dt)? {
                PrimitiveStatus::Running => {
                    if self.motion.control_period_ms > 0 {
                        std::thread::sleep(std::time::Duration::from_millis(
                            self.motion.control_period_ms,
                        ));
                    }
                }
                terminal => return Ok(terminal),
            }
        }
    }
}
