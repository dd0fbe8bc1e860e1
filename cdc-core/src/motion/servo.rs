//! Servo angle mapping
//!
//! Angles are clamped to the configured range and mapped piecewise-linearly
//! about the center pulse, so asymmetric pulse limits still put 0 degrees
//! at the center.

use crate::config::ServoConfig;
use crate::traits::ServoOutput;

/// Pulse width for an angle, after clamping
pub fn pulse_for_angle(config: &ServoConfig, angle_deg: f32) -> u16 {
    let angle = clamp_angle(config, angle_deg);
    let center = config.center_pulse_us as f32;

    let offset = if angle >= 0.0 {
        (angle / config.max_angle_deg) * (config.max_pulse_us as f32 - center)
    } else {
        (angle / -config.min_angle_deg) * (center - config.min_pulse_us as f32)
    };

    // Offset truncates toward zero
    (config.center_pulse_us as i32 + offset as i32) as u16
}

/// Clamp an angle to the servo range
///
/// NaN maps to 0 degrees.
pub fn clamp_angle(config: &ServoConfig, angle_deg: f32) -> f32 {
    if angle_deg.is_nan() {
        return 0.0;
    }
    angle_deg.clamp(config.min_angle_deg, config.max_angle_deg)
}

/// Servo with angle tracking
pub struct Servo<V> {
    output: V,
    config: ServoConfig,
    angle_deg: f32,
}

impl<V: ServoOutput> Servo<V> {
    /// Wrap a PWM output; the output is not written until the first `set_angle`
    pub fn new(output: V, config: ServoConfig) -> Self {
        Self {
            output,
            config,
            angle_deg: 0.0,
        }
    }

    /// Move to an angle, clamping it to the range
    ///
    /// Returns the pulse width written.
    pub fn set_angle(&mut self, angle_deg: f32) -> u16 {
        let clamped = clamp_angle(&self.config, angle_deg);
        let pulse = pulse_for_angle(&self.config, clamped);
        self.output.set_pulse_width_us(pulse);
        self.angle_deg = clamped;
        pulse
    }

    /// Last commanded angle
    pub fn angle(&self) -> f32 {
        self.angle_deg
    }

    pub fn config(&self) -> &ServoConfig {
        &self.config
    }

    /// Access the underlying output
    pub fn output(&self) -> &V {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct MockPwm {
        pulse_us: Option<u16>,
    }

    impl ServoOutput for MockPwm {
        fn set_pulse_width_us(&mut self, pulse_us: u16) {
            self.pulse_us = Some(pulse_us);
        }
    }

    #[test]
    fn test_reference_points() {
        let config = ServoConfig::default();
        assert_eq!(pulse_for_angle(&config, 0.0), 1500);
        assert_eq!(pulse_for_angle(&config, 90.0), 2500);
        assert_eq!(pulse_for_angle(&config, -90.0), 500);
        assert_eq!(pulse_for_angle(&config, 30.0), 1833);
        assert_eq!(pulse_for_angle(&config, -30.0), 1167);
    }

    #[test]
    fn test_clamps_out_of_range() {
        let config = ServoConfig::default();
        assert_eq!(pulse_for_angle(&config, 135.0), 2500);
        assert_eq!(pulse_for_angle(&config, -400.0), 500);
    }

    #[test]
    fn test_asymmetric_pulses() {
        let config = ServoConfig {
            min_pulse_us: 1000,
            center_pulse_us: 1500,
            max_pulse_us: 2500,
            ..ServoConfig::default()
        };
        assert_eq!(pulse_for_angle(&config, 90.0), 2500);
        assert_eq!(pulse_for_angle(&config, -90.0), 1000);
        assert_eq!(pulse_for_angle(&config, -45.0), 1250);
    }

    #[test]
    fn test_servo_tracks_clamped_angle() {
        let mut servo = Servo::new(MockPwm { pulse_us: None }, ServoConfig::default());
        assert_eq!(servo.output().pulse_us, None);

        servo.set_angle(120.0);
        assert_eq!(servo.angle(), 90.0);
        assert_eq!(servo.output().pulse_us, Some(2500));

        servo.set_angle(f32::NAN);
        assert_eq!(servo.angle(), 0.0);
        assert_eq!(servo.output().pulse_us, Some(1500));
    }

    proptest! {
        #[test]
        fn prop_pulse_bounded(angle in -1000.0f32..1000.0) {
            let config = ServoConfig::default();
            let pulse = pulse_for_angle(&config, angle);
            prop_assert!((500..=2500).contains(&pulse));
        }

        #[test]
        fn prop_pulse_monotonic(a in -90.0f32..90.0, b in -90.0f32..90.0) {
            let config = ServoConfig::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(pulse_for_angle(&config, lo) <= pulse_for_angle(&config, hi));
        }
    }
}
