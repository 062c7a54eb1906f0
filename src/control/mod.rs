//! Closed-loop control: wall-following steering and motion primitives.

mod motion;
mod pid;

pub use motion::{AbortReason, MotionExecutor, Primitive, PrimitiveStatus};
pub use pid::WallFollower;
