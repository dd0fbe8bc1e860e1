//! Servo PWM output trait

/// PWM output driving a hobby servo
///
/// The output runs at the servo frame rate (50 Hz); only the pulse
/// width changes.
pub trait ServoOutput {
    /// Set the high-time of each frame in microseconds
    fn set_pulse_width_us(&mut self, pulse_us: u16);
}
