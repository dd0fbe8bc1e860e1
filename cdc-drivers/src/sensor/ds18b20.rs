//! DS18B20 digital thermometer
//!
//! Single device on a dedicated one-wire bus, addressed with Skip ROM.
//! Each read starts a 12-bit conversion and waits for it to finish, so a
//! reading blocks for roughly 750 ms.

use cdc_core::traits::{SensorError, TemperatureSensor};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use super::onewire::{crc8, OneWire};

/// Function commands
pub mod cmd {
    pub const CONVERT_T: u8 = 0x44;
    pub const READ_SCRATCHPAD: u8 = 0xBE;
}

/// Worst-case 12-bit conversion time
pub const CONVERSION_MS: u32 = 750;

/// Scratchpad length including the CRC byte
pub const SCRATCHPAD_LEN: usize = 9;

/// °C per LSB at 12-bit resolution
const CELSIUS_PER_LSB: f32 = 0.0625;

/// Convert the raw temperature register to °C
pub fn decode_raw(lsb: u8, msb: u8) -> f32 {
    i16::from_le_bytes([lsb, msb]) as f32 * CELSIUS_PER_LSB
}

/// Validate a scratchpad and extract the temperature
pub fn decode_scratchpad(scratchpad: &[u8; SCRATCHPAD_LEN]) -> Result<f32, SensorError> {
    if crc8(&scratchpad[..8]) != scratchpad[8] {
        return Err(SensorError::Crc);
    }
    Ok(decode_raw(scratchpad[0], scratchpad[1]))
}

/// DS18B20 on its own bus
pub struct Ds18b20<P, D> {
    bus: OneWire<P, D>,
}

impl<P, D> Ds18b20<P, D>
where
    P: OutputPin + InputPin,
    D: DelayNs,
{
    pub fn new(bus: OneWire<P, D>) -> Self {
        Self { bus }
    }

    /// Start a conversion and wait for it
    pub fn convert(&mut self) -> Result<(), SensorError> {
        self.bus.select_only()?;
        self.bus.write_byte(cmd::CONVERT_T)?;
        self.bus.delay_ms(CONVERSION_MS);
        Ok(())
    }

    pub fn read_scratchpad(&mut self) -> Result<[u8; SCRATCHPAD_LEN], SensorError> {
        self.bus.select_only()?;
        self.bus.write_byte(cmd::READ_SCRATCHPAD)?;
        let mut scratchpad = [0u8; SCRATCHPAD_LEN];
        self.bus.read_bytes(&mut scratchpad)?;
        Ok(scratchpad)
    }
}

impl<P, D> TemperatureSensor for Ds18b20<P, D>
where
    P: OutputPin + InputPin,
    D: DelayNs,
{
    fn read_celsius(&mut self) -> Result<f32, SensorError> {
        self.convert()?;
        let scratchpad = self.read_scratchpad()?;
        decode_scratchpad(&scratchpad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::onewire::testing::{line, written_bytes, Slot};

    /// Presence on both resets followed by the scratchpad bits
    fn script(scratchpad: &[u8; SCRATCHPAD_LEN]) -> Vec<bool> {
        let mut samples = vec![true, false, true, false];
        for byte in scratchpad {
            for i in 0..8 {
                samples.push(byte & (1 << i) != 0);
            }
        }
        samples
    }

    #[test]
    fn test_decode_raw() {
        assert_eq!(decode_raw(0x50, 0x05), 85.0);
        assert_eq!(decode_raw(0x91, 0x01), 25.0625);
        assert_eq!(decode_raw(0x5E, 0xFF), -10.125);
        assert_eq!(decode_raw(0x00, 0x00), 0.0);
    }

    #[test]
    fn test_read_power_on_value() {
        let l = line(&script(&[0x50, 0x05, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0x1C]));
        let mut sensor = Ds18b20::new(OneWire::new(l.pin, l.delay).unwrap());

        assert_eq!(sensor.read_celsius(), Ok(85.0));

        let slots = l.slots.borrow();
        assert_eq!(
            written_bytes(&slots),
            vec![0xCC, cmd::CONVERT_T, 0xCC, cmd::READ_SCRATCHPAD]
        );
        assert_eq!(slots.iter().filter(|s| **s == Slot::Reset).count(), 2);
        assert_eq!(slots.iter().filter(|s| **s == Slot::Read).count(), 72);
        assert!(l.now_ns.get() >= CONVERSION_MS as u64 * 1_000_000);
    }

    #[test]
    fn test_read_negative() {
        let l = line(&script(&[0x5E, 0xFF, 0x4B, 0x46, 0x7F, 0xFF, 0x02, 0x10, 0xB6]));
        let mut sensor = Ds18b20::new(OneWire::new(l.pin, l.delay).unwrap());
        assert_eq!(sensor.read_celsius(), Ok(-10.125));
    }

    #[test]
    fn test_crc_mismatch() {
        let l = line(&script(&[0x50, 0x05, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0x1D]));
        let mut sensor = Ds18b20::new(OneWire::new(l.pin, l.delay).unwrap());
        assert_eq!(sensor.read_celsius(), Err(SensorError::Crc));
    }

    #[test]
    fn test_missing_sensor() {
        // Line stays high: no presence pulse
        let l = line(&[]);
        let mut sensor = Ds18b20::new(OneWire::new(l.pin, l.delay).unwrap());
        assert_eq!(sensor.read_celsius(), Err(SensorError::NoPresence));
        assert_eq!(*l.slots.borrow(), vec![Slot::Reset]);
    }
}
