//! VyuhaNav - flood-fill maze navigation core for a micromouse robot
//!
//! Explores an unknown grid maze cell by cell, maps walls incrementally, and
//! drives the shortest known path to the goal using flood-fill replanning,
//! quadrature odometry, and PID wall-following.
//!
//! ## Architecture
//!
//! - [`encoder`]: lock-free quadrature tick counting shared with the edge
//!   handlers
//! - [`maze`]: wall map, flood-fill distance field, next-direction policy
//! - [`control`]: PID wall-following and encoder-terminated motion primitives
//! - [`navigation`]: the scan / replan / turn / move decision loop
//! - [`devices`]: motor and range-sensor traits with mock and simulator
//!   backends

pub mod config;
pub mod control;
pub mod devices;
pub mod encoder;
pub mod error;
pub mod maze;
pub mod navigation;

// Re-export commonly used types
pub use config::VyuhaConfig;
pub use error::{Result, VyuhaError};
