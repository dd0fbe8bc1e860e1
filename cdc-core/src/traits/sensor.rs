//! Sensor traits
//!
//! Temperature (one-wire), range (I2C time-of-flight) and the homing
//! limit switch.

/// Errors that can occur while reading a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// No device answered the reset pulse
    NoPresence,
    /// Checksum over the received data did not match
    Crc,
    /// Bus transaction failed
    Bus,
    /// Measurement did not complete in time
    Timeout,
    /// Device identified as something else
    WrongDevice,
    /// Range measurement found no target
    NoTarget,
    /// Range measurement reported an error code
    RangeFault(u8),
}

/// Trait for temperature sensors
pub trait TemperatureSensor {
    /// Perform a conversion and read the temperature in degrees Celsius
    ///
    /// May block for the full conversion time.
    fn read_celsius(&mut self) -> Result<f32, SensorError>;
}

/// Trait for single-shot distance sensors
pub trait RangeSensor {
    /// Measure the distance to the nearest target in millimeters
    ///
    /// A reading of 0 is a valid measurement.
    fn read_range_mm(&mut self) -> Result<u8, SensorError>;
}

/// Homing limit switch
pub trait LimitSwitch {
    /// Check if the switch is currently pressed
    fn is_triggered(&mut self) -> bool;
}
