//! Scriptable device fakes for testing

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{DistanceReading, MotorDriver, RangeSensors, WheelSpeeds};
use crate::error::Result;

/// Mock motor driver recording every issued command.
///
/// Clones share the same command log, so a test can keep a handle while the
/// executor owns the driver.
#[derive(Clone, Default)]
pub struct MockMotors {
    commands: Arc<Mutex<Vec<WheelSpeeds>>>,
}

impl MockMotors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command issued so far, oldest first
    pub fn commands(&self) -> Vec<WheelSpeeds> {
        self.commands.lock().unwrap().clone()
    }

    /// Most recent command, if any
    pub fn last(&self) -> Option<WheelSpeeds> {
        self.commands.lock().unwrap().last().copied()
    }

    /// True when the last command (or absence of one) leaves the wheels still
    pub fn is_stopped(&self) -> bool {
        self.last().map(|c| c == WheelSpeeds::zero()).unwrap_or(true)
    }
}

impl MotorDriver for MockMotors {
    fn set_motors(&mut self, left: i16, right: i16) -> Result<()> {
        self.commands
            .lock()
            .unwrap()
            .push(WheelSpeeds::new(left, right));
        Ok(())
    }
}

/// Range sensor fake replaying a scripted sequence of readings.
///
/// Once the script runs out the last reading repeats forever, so open-ended
/// control loops keep getting data.
pub struct ScriptedRanges {
    script: VecDeque<DistanceReading>,
    last: DistanceReading,
}

impl ScriptedRanges {
    pub fn new(readings: impl IntoIterator<Item = DistanceReading>) -> Self {
        Self {
            script: readings.into_iter().collect(),
            last: DistanceReading::far(),
        }
    }

    /// Sensors that always report open space
    pub fn always_far() -> Self {
        Self::new([])
    }

    /// Sensors pinned to one reading
    pub fn constant(reading: DistanceReading) -> Self {
        let mut ranges = Self::new([]);
        ranges.last = reading;
        ranges
    }
}

impl RangeSensors for ScriptedRanges {
    fn read(&mut self) -> Result<DistanceReading> {
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        Ok(self.last)
    }
}
