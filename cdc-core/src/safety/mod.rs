//! Safety supervision
//!
//! Latches the emergency stop and detects abort requests arriving on the
//! console while long-running operations hold the command loop.

pub mod estop;

pub use estop::{AbortCheck, AbortScanner, EmergencyStop, ABORT_TOKEN, MAX_SCAN_BYTES};
