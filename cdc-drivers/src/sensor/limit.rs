//! GPIO limit switch

use cdc_core::traits::LimitSwitch;
use embedded_hal::digital::InputPin;

/// Mechanical limit switch on a GPIO input
///
/// Normally wired active-low against a pull-up. A pin read error is
/// reported as triggered so motion toward the switch stops.
pub struct GpioLimitSwitch<P> {
    pin: P,
    active_low: bool,
}

impl<P: InputPin> GpioLimitSwitch<P> {
    pub fn new(pin: P, active_low: bool) -> Self {
        Self { pin, active_low }
    }
}

impl<P: InputPin> LimitSwitch for GpioLimitSwitch<P> {
    fn is_triggered(&mut self) -> bool {
        match self.pin.is_low() {
            Ok(low) => low == self.active_low,
            Err(_) => true,
        }
    }
}
