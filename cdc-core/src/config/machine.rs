//! Machine configuration
//!
//! Defaults match the reference hardware: 100 steps/mm lead screw with a
//! 0-200 mm travel, a 500-2500 µs servo and a normally-open limit switch
//! wired to ground.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// steps_per_mm must be non-zero
    ZeroStepsPerMm,
    /// Height range is empty or inverted
    InvalidHeightRange,
    /// Angle range is empty or inverted
    InvalidAngleRange,
    /// Servo pulses must satisfy min < center < max
    InvalidServoPulses,
    /// Step half period must be non-zero
    ZeroHalfPeriod,
    /// Abort poll interval must be non-zero
    ZeroPollInterval,
    /// Homing timeout must be non-zero
    ZeroHomingTimeout,
}

/// Height axis (stepper) configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AxisConfig {
    /// Steps per millimeter of travel
    pub steps_per_mm: u32,
    /// Lowest accepted height (mm)
    pub min_height_mm: f32,
    /// Highest accepted height (mm)
    pub max_height_mm: f32,
    /// Step pulse half period for normal moves (µs)
    pub step_half_period_us: u32,
    /// Delay after changing the direction line (ms)
    pub direction_settle_ms: u32,
    /// Steps between scans of the console for an abort token
    pub abort_poll_interval_steps: u32,
    /// Driver enable input is active low
    pub enable_active_low: bool,
    /// Direction line level for positive travel (away from the limit switch)
    ///
    /// Low by default; homing seeks with the line high.
    pub positive_dir_high: bool,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            steps_per_mm: 100,
            min_height_mm: 0.0,
            max_height_mm: 200.0,
            step_half_period_us: 1_000,
            direction_settle_ms: 10,
            abort_poll_interval_steps: 100,
            enable_active_low: true,
            positive_dir_high: false,
        }
    }
}

impl AxisConfig {
    /// Convert millimeters to steps, truncating toward zero
    pub fn mm_to_steps(&self, mm: f32) -> i32 {
        (mm * self.steps_per_mm as f32) as i32
    }

    /// Convert steps to millimeters
    pub fn steps_to_mm(&self, steps: i32) -> f32 {
        steps as f32 / self.steps_per_mm as f32
    }

    /// Check a height against the travel range (NaN is rejected)
    pub fn height_in_range(&self, mm: f32) -> bool {
        (self.min_height_mm..=self.max_height_mm).contains(&mm)
    }
}

/// Servo pulse mapping configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ServoConfig {
    /// Pulse at the minimum angle (µs)
    pub min_pulse_us: u16,
    /// Pulse at 0 degrees (µs)
    pub center_pulse_us: u16,
    /// Pulse at the maximum angle (µs)
    pub max_pulse_us: u16,
    pub min_angle_deg: f32,
    pub max_angle_deg: f32,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            min_pulse_us: 500,
            center_pulse_us: 1_500,
            max_pulse_us: 2_500,
            min_angle_deg: -90.0,
            max_angle_deg: 90.0,
        }
    }
}

impl ServoConfig {
    /// Check an angle against the servo range (NaN is rejected)
    pub fn angle_in_range(&self, deg: f32) -> bool {
        (self.min_angle_deg..=self.max_angle_deg).contains(&deg)
    }
}

/// Limit-switch homing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HomingConfig {
    /// Hold time after centering the servo (ms)
    pub servo_settle_ms: u32,
    /// Maximum steps taken to clear an already-pressed switch
    pub backoff_max_steps: u32,
    /// Half period while clearing the switch (µs)
    pub backoff_half_period_us: u32,
    /// Pause after clearing the switch (ms)
    pub backoff_settle_ms: u32,
    /// Half period while seeking the switch (µs)
    pub seek_half_period_us: u32,
    /// Time budget for the seek phase (ms)
    pub timeout_ms: u32,
    /// Steps between progress reports while seeking
    pub report_interval_steps: u32,
    /// Steps to back off after first contact
    pub fine_backoff_steps: u32,
    /// Half period for the slow re-approach (µs)
    pub fine_half_period_us: u32,
    /// Step limit for the slow re-approach
    pub fine_approach_max_steps: u32,
    /// Pause after re-enabling the driver when clearing an emergency stop (ms)
    pub reenable_settle_ms: u32,
    /// Limit switch pulls its input low when pressed
    pub limit_active_low: bool,
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            servo_settle_ms: 1_000,
            backoff_max_steps: 500,
            backoff_half_period_us: 2_000,
            backoff_settle_ms: 100,
            seek_half_period_us: 1_000,
            timeout_ms: 30_000,
            report_interval_steps: 100,
            fine_backoff_steps: 20,
            fine_half_period_us: 10_000,
            fine_approach_max_steps: 200,
            reenable_settle_ms: 100,
            limit_active_low: true,
        }
    }
}

impl HomingConfig {
    /// Time consumed by one seek step (ms)
    pub fn seek_step_ms(&self) -> u32 {
        (2 * self.seek_half_period_us).div_ceil(1_000).max(1)
    }

    /// Maximum seek steps within the time budget
    pub fn max_seek_steps(&self) -> u32 {
        self.timeout_ms / self.seek_step_ms()
    }
}

/// Sensor reporting configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SensorConfig {
    /// Distance reported before the first good range reading (mm)
    pub range_fallback_mm: u8,
    /// Fixed values for the third and fourth distance channels (mm)
    pub auxiliary_distances_mm: [u16; 2],
    /// Temperature reported before the first good reading (°C)
    pub temperature_fallback_c: f32,
    /// Capacitance at zero height (pF)
    pub capacitance_base_pf: f32,
    /// Capacitance change per millimeter of height (pF)
    pub capacitance_per_mm: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            range_fallback_mm: 12,
            auxiliary_distances_mm: [156, 157],
            temperature_fallback_c: 25.0,
            capacitance_base_pf: 120.5,
            capacitance_per_mm: 0.5,
        }
    }
}

/// Console behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConsoleConfig {
    /// Echo `[DEBUG]` trace lines at startup
    pub debug: bool,
    /// Print the banner at startup
    pub banner: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            debug: false,
            banner: true,
        }
    }
}

/// Complete machine configuration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MachineConfig {
    pub axis: AxisConfig,
    pub servo: ServoConfig,
    pub homing: HomingConfig,
    pub sensors: SensorConfig,
    pub console: ConsoleConfig,
}

impl MachineConfig {
    /// Check the configuration for values the controller cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let axis = &self.axis;
        if axis.steps_per_mm == 0 {
            return Err(ConfigError::ZeroStepsPerMm);
        }
        if !(axis.min_height_mm < axis.max_height_mm) {
            return Err(ConfigError::InvalidHeightRange);
        }
        if axis.step_half_period_us == 0
            || self.homing.seek_half_period_us == 0
            || self.homing.backoff_half_period_us == 0
            || self.homing.fine_half_period_us == 0
        {
            return Err(ConfigError::ZeroHalfPeriod);
        }
        if axis.abort_poll_interval_steps == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }

        let servo = &self.servo;
        if !(servo.min_angle_deg < 0.0 && 0.0 < servo.max_angle_deg) {
            return Err(ConfigError::InvalidAngleRange);
        }
        if !(servo.min_pulse_us < servo.center_pulse_us
            && servo.center_pulse_us < servo.max_pulse_us)
        {
            return Err(ConfigError::InvalidServoPulses);
        }

        if self.homing.timeout_ms == 0 {
            return Err(ConfigError::ZeroHomingTimeout);
        }

        Ok(())
    }
}
