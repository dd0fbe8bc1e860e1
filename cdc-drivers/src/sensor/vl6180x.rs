//! VL6180X time-of-flight proximity sensor
//!
//! Registers use 16-bit big-endian addresses. Ranging is single-shot:
//! each read starts one measurement and polls for completion.

use cdc_core::traits::{RangeSensor, SensorError};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

/// Fixed 7-bit bus address after power-up
pub const DEFAULT_ADDRESS: u8 = 0x29;

/// Value of `IDENTIFICATION_MODEL_ID`
pub const MODEL_ID: u8 = 0xB4;

/// Completion polls, 1 ms apart, before giving up
pub const MAX_POLLS: u32 = 100;

/// Range status error code reported when nothing is in view
pub const ERROR_NO_TARGET: u8 = 11;

/// Register addresses
pub mod reg {
    pub const IDENTIFICATION_MODEL_ID: u16 = 0x000;
    pub const SYSTEM_MODE_GPIO1: u16 = 0x011;
    pub const SYSTEM_INTERRUPT_CONFIG_GPIO: u16 = 0x014;
    pub const SYSTEM_INTERRUPT_CLEAR: u16 = 0x015;
    pub const SYSTEM_FRESH_OUT_OF_RESET: u16 = 0x016;
    pub const SYSRANGE_START: u16 = 0x018;
    pub const SYSRANGE_MAX_CONVERGENCE_TIME: u16 = 0x01C;
    pub const SYSRANGE_RANGE_CHECK_ENABLES: u16 = 0x02D;
    pub const SYSRANGE_VHV_RECALIBRATE: u16 = 0x02E;
    pub const RESULT_RANGE_STATUS: u16 = 0x04D;
    pub const RESULT_INTERRUPT_STATUS_GPIO: u16 = 0x04F;
    pub const RESULT_RANGE_VAL: u16 = 0x062;
}

/// Private settings required after a fresh power-up (ST AN4545)
const PRIVATE_SETTINGS: &[(u16, u8)] = &[
    (0x0207, 0x01),
    (0x0208, 0x01),
    (0x0096, 0x00),
    (0x0097, 0xFD),
    (0x00E3, 0x00),
    (0x00E4, 0x04),
    (0x00E5, 0x02),
    (0x00E6, 0x01),
    (0x00E7, 0x03),
    (0x00F5, 0x02),
    (0x00D9, 0x05),
    (0x00DB, 0xCE),
    (0x00DC, 0x03),
    (0x00DD, 0xF8),
    (0x009F, 0x00),
    (0x00A3, 0x3C),
    (0x00B7, 0x00),
    (0x00BB, 0x3C),
    (0x00B2, 0x09),
    (0x00CA, 0x09),
    (0x0198, 0x01),
    (0x01B0, 0x17),
    (0x01AD, 0x00),
    (0x00FF, 0x05),
    (0x0100, 0x05),
    (0x0199, 0x05),
    (0x01A6, 0x1B),
    (0x01AC, 0x3E),
    (0x01A7, 0x1F),
    (0x0030, 0x00),
];

/// Ranging defaults applied with the private settings
const RANGE_SETTINGS: &[(u16, u8)] = &[
    // 50 ms max convergence
    (reg::SYSRANGE_MAX_CONVERGENCE_TIME, 0x32),
    // Early convergence estimate + SNR check
    (reg::SYSRANGE_RANGE_CHECK_ENABLES, 0x11),
    (reg::SYSRANGE_VHV_RECALIBRATE, 0x01),
    (reg::SYSTEM_MODE_GPIO1, 0x10),
    // New sample ready interrupt
    (reg::SYSTEM_INTERRUPT_CONFIG_GPIO, 0x24),
];

const INTERRUPT_CLEAR_ALL: u8 = 0x07;
const RANGE_READY: u8 = 0x04;

/// VL6180X on a blocking I2C bus
pub struct Vl6180x<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
}

impl<I2C: I2c, D: DelayNs> Vl6180x<I2C, D> {
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self::with_address(i2c, delay, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
        }
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    pub fn read_register(&mut self, register: u16) -> Result<u8, SensorError> {
        let mut value = [0u8];
        self.i2c
            .write_read(self.address, &register.to_be_bytes(), &mut value)
            .map_err(|_| SensorError::Bus)?;
        Ok(value[0])
    }

    pub fn write_register(&mut self, register: u16, value: u8) -> Result<(), SensorError> {
        let [hi, lo] = register.to_be_bytes();
        self.i2c
            .write(self.address, &[hi, lo, value])
            .map_err(|_| SensorError::Bus)
    }

    /// Identify the device and load its settings
    ///
    /// Settings are only written when the device reports a fresh reset,
    /// so calling this again later is cheap.
    pub fn init(&mut self) -> Result<(), SensorError> {
        if self.read_register(reg::IDENTIFICATION_MODEL_ID)? != MODEL_ID {
            return Err(SensorError::WrongDevice);
        }

        if self.read_register(reg::SYSTEM_FRESH_OUT_OF_RESET)? == 1 {
            for &(register, value) in PRIVATE_SETTINGS.iter().chain(RANGE_SETTINGS) {
                self.write_register(register, value)?;
            }
            self.write_register(reg::SYSTEM_FRESH_OUT_OF_RESET, 0)?;
        }

        // Single-shot mode
        self.write_register(reg::SYSRANGE_START, 0x00)
    }

    /// Run one single-shot range measurement
    pub fn measure(&mut self) -> Result<u8, SensorError> {
        self.write_register(reg::SYSTEM_INTERRUPT_CLEAR, INTERRUPT_CLEAR_ALL)?;
        self.write_register(reg::SYSRANGE_START, 0x01)?;

        let mut ready = false;
        for _ in 0..MAX_POLLS {
            self.delay.delay_ms(1);
            if self.read_register(reg::RESULT_INTERRUPT_STATUS_GPIO)? & RANGE_READY != 0 {
                ready = true;
                break;
            }
        }
        if !ready {
            return Err(SensorError::Timeout);
        }

        let range = self.read_register(reg::RESULT_RANGE_VAL)?;
        let status = self.read_register(reg::RESULT_RANGE_STATUS)?;
        self.write_register(reg::SYSTEM_INTERRUPT_CLEAR, INTERRUPT_CLEAR_ALL)?;

        match status >> 4 {
            0 => Ok(range),
            ERROR_NO_TARGET => Err(SensorError::NoTarget),
            code => Err(SensorError::RangeFault(code)),
        }
    }
}

impl<I2C: I2c, D: DelayNs> RangeSensor for Vl6180x<I2C, D> {
    fn read_range_mm(&mut self) -> Result<u8, SensorError> {
        self.measure()
    }
}
