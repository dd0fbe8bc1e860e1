//! Supervisory state
//!
//! The controller reports one of four statuses; the emergency stop latch
//! is tracked separately by the safety module.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::SystemStatus;
