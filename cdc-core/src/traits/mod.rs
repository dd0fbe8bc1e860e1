//! Hardware abstraction traits
//!
//! These traits define the interface between the controller logic
//! and hardware-specific implementations.

pub mod console;
pub mod sensor;
pub mod servo;
pub mod stepper;

pub use console::Console;
pub use sensor::{LimitSwitch, RangeSensor, SensorError, TemperatureSensor};
pub use servo::ServoOutput;
pub use stepper::{Direction, StepperDriver};
