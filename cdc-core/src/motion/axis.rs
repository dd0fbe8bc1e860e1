//! Height axis
//!
//! Open-loop stepper axis. The signed step counter is the only record of
//! where the carriage is; height in millimeters is derived from it.

use embedded_hal::delay::DelayNs;

use crate::config::AxisConfig;
use crate::safety::AbortCheck;
use crate::traits::{Direction, StepperDriver};

/// Result of an interruptible move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MoveOutcome {
    /// All requested steps were taken
    Completed { steps: i32 },
    /// Stopped by an emergency stop after `completed` of `requested` steps
    Aborted { completed: i32, requested: i32 },
}

impl MoveOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, MoveOutcome::Completed { .. })
    }

    /// Signed steps actually taken
    pub fn steps_taken(&self) -> i32 {
        match *self {
            MoveOutcome::Completed { steps } => steps,
            MoveOutcome::Aborted { completed, .. } => completed,
        }
    }
}

/// Stepper-driven linear axis with position accounting
pub struct HeightAxis<S> {
    stepper: S,
    config: AxisConfig,
    position_steps: i32,
}

impl<S: StepperDriver> HeightAxis<S> {
    /// Create an axis at position zero with the driver enabled
    pub fn new(mut stepper: S, config: AxisConfig) -> Self {
        stepper.set_step(false);
        stepper.enable(true);
        Self {
            stepper,
            config,
            position_steps: 0,
        }
    }

    pub fn config(&self) -> &AxisConfig {
        &self.config
    }

    /// Current position in steps
    pub fn position_steps(&self) -> i32 {
        self.position_steps
    }

    /// Current height derived from the step counter
    pub fn height_mm(&self) -> f32 {
        self.config.steps_to_mm(self.position_steps)
    }

    /// Declare the current carriage location as zero
    pub fn reset_position(&mut self) {
        self.position_steps = 0;
    }

    pub fn enable(&mut self, enabled: bool) {
        self.stepper.enable(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.stepper.is_enabled()
    }

    /// Access the underlying driver
    pub fn stepper(&self) -> &S {
        &self.stepper
    }

    /// Set the direction line and wait for the driver to latch it
    pub fn set_direction<D: DelayNs>(&mut self, dir: Direction, delay: &mut D) {
        self.stepper.set_direction(dir);
        delay.delay_ms(self.config.direction_settle_ms);
    }

    /// Emit one step pulse without touching the position counter
    ///
    /// Used by homing, where the position is redefined at the end.
    pub fn pulse<D: DelayNs>(&mut self, half_period_us: u32, delay: &mut D) {
        self.stepper.set_step(true);
        delay.delay_us(half_period_us);
        self.stepper.set_step(false);
        delay.delay_us(half_period_us);
    }

    /// Move by a signed number of steps
    ///
    /// The abort latch is checked before every step and the console is
    /// scanned every `abort_poll_interval_steps` steps. On abort the driver
    /// is disabled and only the completed steps are committed.
    pub fn move_by_steps<D: DelayNs, A: AbortCheck>(
        &mut self,
        steps: i32,
        delay: &mut D,
        abort: &mut A,
    ) -> MoveOutcome {
        if steps == 0 {
            return MoveOutcome::Completed { steps: 0 };
        }

        let dir = Direction::from_steps(steps);
        self.set_direction(dir, delay);
        self.stepper.enable(true);

        let poll_interval = self.config.abort_poll_interval_steps.max(1);
        let half_period = self.config.step_half_period_us;

        for taken in 0..steps.unsigned_abs() {
            if taken % poll_interval == 0 {
                abort.poll();
            }
            if abort.is_aborted() {
                self.stepper.enable(false);
                return MoveOutcome::Aborted {
                    completed: dir.sign() * taken as i32,
                    requested: steps,
                };
            }

            self.pulse(half_period, delay);
            self.position_steps += dir.sign();
        }

        MoveOutcome::Completed { steps }
    }

    /// Move to an absolute height
    ///
    /// The target is converted to steps truncating toward zero. A target
    /// equal to the current position is a no-op.
    pub fn move_to_height<D: DelayNs, A: AbortCheck>(
        &mut self,
        target_mm: f32,
        delay: &mut D,
        abort: &mut A,
    ) -> MoveOutcome {
        let target_steps = self.config.mm_to_steps(target_mm);
        self.move_by_steps(target_steps - self.position_steps, delay, abort)
    }
}
