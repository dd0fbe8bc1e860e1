//! Limit-switch homing
//!
//! Establishes the zero position by driving the carriage into the limit
//! switch, backing off, and re-approaching slowly.

pub mod sequence;

pub use sequence::{
    Homing, HomingError, HomingEvent, HomingOutcome, HomingPhase, HomingSupervisor,
};
