//! Hardware driver implementations
//!
//! Concrete implementations of the traits defined in cdc-core, written
//! against `embedded-hal` 1.0 and `embedded-io` so any HAL can supply
//! the pins and buses:
//!
//! - Step/dir stepper driver
//! - PWM servo output
//! - Limit switch, one-wire DS18B20 and I2C VL6180X sensors
//! - Serial console adapter

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod console;
pub mod sensor;
pub mod servo;
pub mod stepper;
