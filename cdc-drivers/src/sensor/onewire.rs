//! Bit-banged one-wire bus master
//!
//! The bus is a single open-drain line with an external pull-up. Driving
//! the pin high releases the line; driving it low pulls it down. All
//! timing is standard speed.

use cdc_core::traits::SensorError;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Skip ROM: address the only device on the bus
pub const CMD_SKIP_ROM: u8 = 0xCC;

/// Reset pulse and presence window
const RESET_LOW_US: u32 = 480;
const PRESENCE_SAMPLE_US: u32 = 70;
const PRESENCE_RECOVERY_US: u32 = RESET_LOW_US - PRESENCE_SAMPLE_US;

/// Write slots
const WRITE_ONE_LOW_US: u32 = 6;
const WRITE_ONE_HIGH_US: u32 = 64;
const WRITE_ZERO_LOW_US: u32 = 60;
const WRITE_ZERO_HIGH_US: u32 = 10;

/// Read slot
const READ_LOW_US: u32 = 3;
const READ_SAMPLE_US: u32 = 12;
const READ_RECOVERY_US: u32 = 50;

/// One-wire master on an open-drain pin
pub struct OneWire<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> OneWire<P, D>
where
    P: OutputPin + InputPin,
    D: DelayNs,
{
    /// Take the pin and release the bus
    pub fn new(pin: P, delay: D) -> Result<Self, SensorError> {
        let mut bus = Self { pin, delay };
        bus.release()?;
        Ok(bus)
    }

    fn release(&mut self) -> Result<(), SensorError> {
        self.pin.set_high().map_err(|_| SensorError::Bus)
    }

    fn pull_low(&mut self) -> Result<(), SensorError> {
        self.pin.set_low().map_err(|_| SensorError::Bus)
    }

    fn sample(&mut self) -> Result<bool, SensorError> {
        self.pin.is_high().map_err(|_| SensorError::Bus)
    }

    /// Issue a reset pulse and wait for a presence pulse
    ///
    /// Fails with `Bus` if the line is held low before the reset and with
    /// `NoPresence` if no device answers.
    pub fn reset(&mut self) -> Result<(), SensorError> {
        if !self.sample()? {
            return Err(SensorError::Bus);
        }

        self.pull_low()?;
        self.delay.delay_us(RESET_LOW_US);
        self.release()?;
        self.delay.delay_us(PRESENCE_SAMPLE_US);
        let present = !self.sample()?;
        self.delay.delay_us(PRESENCE_RECOVERY_US);

        if present {
            Ok(())
        } else {
            Err(SensorError::NoPresence)
        }
    }

    pub fn write_bit(&mut self, bit: bool) -> Result<(), SensorError> {
        let (low, high) = if bit {
            (WRITE_ONE_LOW_US, WRITE_ONE_HIGH_US)
        } else {
            (WRITE_ZERO_LOW_US, WRITE_ZERO_HIGH_US)
        };
        self.pull_low()?;
        self.delay.delay_us(low);
        self.release()?;
        self.delay.delay_us(high);
        Ok(())
    }

    pub fn read_bit(&mut self) -> Result<bool, SensorError> {
        self.pull_low()?;
        self.delay.delay_us(READ_LOW_US);
        self.release()?;
        self.delay.delay_us(READ_SAMPLE_US);
        let bit = self.sample()?;
        self.delay.delay_us(READ_RECOVERY_US);
        Ok(bit)
    }

    /// Write a byte LSB first
    pub fn write_byte(&mut self, byte: u8) -> Result<(), SensorError> {
        for i in 0..8 {
            self.write_bit(byte & (1 << i) != 0)?;
        }
        Ok(())
    }

    /// Read a byte LSB first
    pub fn read_byte(&mut self) -> Result<u8, SensorError> {
        let mut byte = 0u8;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }

    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), SensorError> {
        for byte in buf.iter_mut() {
            *byte = self.read_byte()?;
        }
        Ok(())
    }

    /// Reset, then address the single device on the bus
    pub fn select_only(&mut self) -> Result<(), SensorError> {
        self.reset()?;
        self.write_byte(CMD_SKIP_ROM)
    }

    /// Wait on the bus clock, e.g. for a conversion to finish
    pub fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}

/// Dallas/Maxim CRC-8 (polynomial x^8 + x^5 + x^4 + 1, LSB first)
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        let mut current = byte;
        for _ in 0..8 {
            let mix = (crc ^ current) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            current >>= 1;
        }
    }
    crc
}
