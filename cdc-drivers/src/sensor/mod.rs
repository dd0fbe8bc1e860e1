//! Sensor implementations

pub mod ds18b20;
pub mod limit;
pub mod onewire;
pub mod vl6180x;

pub use ds18b20::Ds18b20;
pub use limit::GpioLimitSwitch;
pub use onewire::OneWire;
pub use vl6180x::Vl6180x;
