//! STEP/DIR/ENABLE stepper driver
//!
//! Generic driver for A4988/DRV8825-style boards: one rising edge on STEP
//! moves one (micro)step in the direction latched on DIR. Pulse timing is
//! left to the caller.

use cdc_core::traits::{Direction, StepperDriver};
use embedded_hal::digital::OutputPin;

/// Step/direction stepper on three GPIO outputs
pub struct StepDirStepper<STEP, DIR, EN> {
    step: STEP,
    dir: DIR,
    enable: EN,
    /// If true, driver enabled = EN pin LOW
    enable_active_low: bool,
    /// If true, Positive = DIR pin HIGH
    positive_dir_high: bool,
    direction: Direction,
    enabled: bool,
}

impl<STEP, DIR, EN> StepDirStepper<STEP, DIR, EN>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
{
    /// Create a driver with STEP low and the outputs disabled
    pub fn new(
        step: STEP,
        dir: DIR,
        enable: EN,
        enable_active_low: bool,
        positive_dir_high: bool,
    ) -> Self {
        let mut driver = Self {
            step,
            dir,
            enable,
            enable_active_low,
            positive_dir_high,
            direction: Direction::Positive,
            enabled: false,
        };
        driver.set_step(false);
        driver.set_direction(Direction::Positive);
        driver.enable(false);
        driver
    }

    /// Release the pins
    pub fn release(self) -> (STEP, DIR, EN) {
        (self.step, self.dir, self.enable)
    }
}

fn drive<P: OutputPin>(pin: &mut P, high: bool) {
    // GPIO writes on the supported boards cannot fail
    let _ = if high { pin.set_high() } else { pin.set_low() };
}

impl<STEP, DIR, EN> StepperDriver for StepDirStepper<STEP, DIR, EN>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
{
    fn set_direction(&mut self, dir: Direction) {
        self.direction = dir;
        let high = (dir == Direction::Positive) == self.positive_dir_high;
        drive(&mut self.dir, high);
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn enable(&mut self, enabled: bool) {
        self.enabled = enabled;
        drive(&mut self.enable, enabled != self.enable_active_low);
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_step(&mut self, high: bool) {
        drive(&mut self.step, high);
    }
}
