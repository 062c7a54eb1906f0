//! Quadrature encoder decoding and shared tick counters
//!
//! Each wheel has an A/B channel pair decoded edge by edge through a 16-entry
//! transition table. The decoder lives on the interrupt side and is the only
//! writer of its wheel's counter; the control loop holds [`EncoderCounters`]
//! and only reads or resets. Counters are atomics, so no lock sits between
//! the edge handlers and the control loop.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Tick delta per state transition, indexed by `(prev << 2) | curr` where a
/// state is `(A << 1) | B`. Invalid transitions (repeat or double phase
/// step) decode to 0.
const TRANSITION_TABLE: [i8; 16] = [
    0, -1, 1, 0, //
    1, 0, 0, -1, //
    -1, 0, 0, 1, //
    0, 1, -1, 0,
];

/// Which wheel a decoder feeds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wheel {
    Left,
    Right,
}

/// Shared per-wheel tick counters, read and reset by the control loop
#[derive(Clone, Debug)]
pub struct EncoderCounters {
    left: Arc<AtomicI64>,
    right: Arc<AtomicI64>,
}

impl EncoderCounters {
    pub fn new() -> Self {
        Self {
            left: Arc::new(AtomicI64::new(0)),
            right: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Make the edge-handler decoder for one wheel.
    ///
    /// The decoder owns its phase history; only the counter is shared.
    pub fn decoder(&self, wheel: Wheel) -> QuadratureDecoder {
        let count = match wheel {
            Wheel::Left => Arc::clone(&self.left),
            Wheel::Right => Arc::clone(&self.right),
        };
        QuadratureDecoder { history: 0, count }
    }

    /// Zero both counters. Edges arriving during the reset land after it.
    pub fn reset(&self) {
        self.left.store(0, Ordering::Relaxed);
        self.right.store(0, Ordering::Relaxed);
    }

    pub fn left(&self) -> i64 {
        self.left.load(Ordering::Relaxed)
    }

    pub fn right(&self) -> i64 {
        self.right.load(Ordering::Relaxed)
    }

    /// Mean tick magnitude of the two wheels.
    ///
    /// Magnitude-based so it grows during in-place turns (wheels counting in
    /// opposite directions) exactly as it does driving straight.
    pub fn average(&self) -> i64 {
        (self.left().abs() + self.right().abs()) / 2
    }
}

impl Default for EncoderCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Edge-handler side of one wheel's quadrature channel pair
pub struct QuadratureDecoder {
    history: u8,
    count: Arc<AtomicI64>,
}

impl QuadratureDecoder {
    /// Decode one A/B edge and apply the tick delta to the wheel counter.
    pub fn on_edge(&mut self, a: bool, b: bool) {
        let state = ((a as u8) << 1) | (b as u8);
        self.history = (self.history << 2) | state;
        let delta = TRANSITION_TABLE[(self.history & 0x0F) as usize];
        if delta != 0 {
            self.count.fetch_add(delta as i64, Ordering::Relaxed);
        }
    }
}
