//! PWM hobby servo output
//!
//! Converts a pulse width into a duty cycle over a fixed frame period
//! (20 ms for standard servos).

use cdc_core::traits::ServoOutput;
use embedded_hal::pwm::SetDutyCycle;

/// Standard servo frame period
pub const DEFAULT_PERIOD_US: u16 = 20_000;

/// Servo driven by a PWM channel
pub struct PwmServo<P> {
    pwm: P,
    period_us: u16,
    pulse_us: u16,
}

impl<P: SetDutyCycle> PwmServo<P> {
    /// Create a servo output
    ///
    /// The channel must already run at a frequency of `1 / period_us`.
    pub fn new(pwm: P, period_us: u16) -> Self {
        Self {
            pwm,
            period_us: period_us.max(1),
            pulse_us: 0,
        }
    }

    /// Last commanded pulse width
    pub fn pulse_us(&self) -> u16 {
        self.pulse_us
    }
}

impl<P: SetDutyCycle> ServoOutput for PwmServo<P> {
    fn set_pulse_width_us(&mut self, pulse_us: u16) {
        let pulse_us = pulse_us.min(self.period_us);
        self.pulse_us = pulse_us;
        let _ = self.pwm.set_duty_cycle_fraction(pulse_us, self.period_us);
    }
}
