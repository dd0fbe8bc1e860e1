//! Actuator motion
//!
//! Open-loop height axis with interruptible moves, and the servo
//! angle-to-pulse mapping.

pub mod axis;
pub mod servo;

pub use axis::{HeightAxis, MoveOutcome};
pub use servo::{pulse_for_angle, Servo};
