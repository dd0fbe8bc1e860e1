//! Board-agnostic core logic for the CDC motion and sensor controller
//!
//! Everything here runs against the hardware traits in [`traits`], so the
//! whole command path can be exercised on the host:
//!
//! - Hardware abstraction traits (stepper, servo, sensors, console)
//! - Height axis and servo mapping
//! - Limit-switch homing sequence
//! - Emergency-stop latch and abort token scanning
//! - Supervisory status machine
//! - The command controller tying it together

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod controller;
pub mod homing;
pub mod motion;
pub mod safety;
pub mod state;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{Controller, Hardware, Session, FIRMWARE_NAME};
