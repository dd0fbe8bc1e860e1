//! Stepper motor driver trait
//!
//! Abstracts a step/direction driver (A4988, DRV8825, TMC in standalone
//! mode). Pulse timing is owned by the caller so the core can interleave
//! abort checks between steps.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis travel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Increasing step count (down, away from the limit switch)
    Positive,
    /// Decreasing step count (up, toward the limit switch)
    Negative,
}

impl Direction {
    /// Direction for a signed step count
    pub fn from_steps(steps: i32) -> Self {
        if steps > 0 {
            Direction::Positive
        } else {
            Direction::Negative
        }
    }

    /// Sign applied to the position counter for one step
    pub fn sign(self) -> i32 {
        match self {
            Direction::Positive => 1,
            Direction::Negative => -1,
        }
    }
}

/// Trait for step/direction stepper drivers
pub trait StepperDriver {
    /// Set the direction line
    fn set_direction(&mut self, dir: Direction);

    /// Get the current direction
    fn direction(&self) -> Direction;

    /// Enable or disable the driver outputs
    ///
    /// When disabled, the motor is free to rotate and does not hold position.
    fn enable(&mut self, enabled: bool);

    /// Check if the driver is enabled
    fn is_enabled(&self) -> bool;

    /// Drive the step line
    ///
    /// One step is a high level followed by a low level, each held for
    /// the configured half period.
    fn set_step(&mut self, high: bool);
}
