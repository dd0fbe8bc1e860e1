//! Homing sequence
//!
//! Phases run in order:
//!
//! ```text
//! Idle → ServoCentering → CheckingLimit → [Backoff] → SeekingLimit
//!      → FineApproach → Reset → Ready
//! ```
//!
//! Any abort or timeout ends in `Error` with the driver disabled and the
//! position counter untouched. The servo is centered first so the head
//! cannot strike the frame while the carriage travels.

use embedded_hal::delay::DelayNs;

use crate::config::HomingConfig;
use crate::motion::{HeightAxis, Servo};
use crate::safety::AbortCheck;
use crate::traits::{Direction, LimitSwitch, ServoOutput, StepperDriver};

/// Homing phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomingPhase {
    #[default]
    Idle,
    /// Driving the servo to 0 degrees and waiting for it to settle
    ServoCentering,
    /// Reading the switch before any motion
    CheckingLimit,
    /// Stepping off a switch that was already pressed
    Backoff,
    /// Travelling toward the switch at seek speed
    SeekingLimit,
    /// Backing off and re-approaching slowly for a repeatable edge
    FineApproach,
    /// Zeroing position and angle
    Reset,
    /// Homed
    Ready,
    /// Interrupted or timed out
    Error,
}

/// Why homing failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomingError {
    /// Emergency stop during the given phase
    Interrupted { phase: HomingPhase },
    /// Switch not reached within the step or time budget of the phase
    Timeout { phase: HomingPhase, steps: u32 },
}

/// Successful homing summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HomingOutcome {
    /// Steps taken while seeking the switch
    pub seek_steps: u32,
    /// Whether the switch was already pressed at the start
    pub backed_off: bool,
}

/// Progress notifications emitted while homing
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomingEvent {
    /// A new phase was entered
    Phase(HomingPhase),
    /// Servo reached center after the settle time
    ServoCentered,
    /// Pressed switch released during backoff
    LimitCleared,
    /// Periodic seek progress
    SeekProgress { steps: u32, distance_mm: f32 },
}

/// Abort source and progress sink for a homing run
pub trait HomingSupervisor: AbortCheck {
    /// Release a latched emergency stop before motion starts
    fn release(&mut self);

    /// Receive a progress notification
    fn report(&mut self, event: HomingEvent);
}

/// Limit-switch homing state machine
#[derive(Debug, Clone)]
pub struct Homing {
    config: HomingConfig,
    phase: HomingPhase,
}

impl Homing {
    pub fn new(config: HomingConfig) -> Self {
        Self {
            config,
            phase: HomingPhase::Idle,
        }
    }

    /// Current phase
    pub fn phase(&self) -> HomingPhase {
        self.phase
    }

    pub fn config(&self) -> &HomingConfig {
        &self.config
    }

    fn enter<H: HomingSupervisor>(&mut self, phase: HomingPhase, supervisor: &mut H) {
        self.phase = phase;
        supervisor.report(HomingEvent::Phase(phase));
    }

    fn fail<S: StepperDriver>(&mut self, axis: &mut HeightAxis<S>, error: HomingError) -> HomingError {
        axis.enable(false);
        self.phase = HomingPhase::Error;
        error
    }

    /// Run the full sequence
    ///
    /// On success the axis position is zero and the servo is at 0 degrees.
    pub fn run<S, V, L, D, H>(
        &mut self,
        axis: &mut HeightAxis<S>,
        servo: &mut Servo<V>,
        limit: &mut L,
        delay: &mut D,
        supervisor: &mut H,
    ) -> Result<HomingOutcome, HomingError>
    where
        S: StepperDriver,
        V: ServoOutput,
        L: LimitSwitch,
        D: DelayNs,
        H: HomingSupervisor,
    {
        let config = self.config;

        self.enter(HomingPhase::ServoCentering, supervisor);
        servo.set_angle(0.0);
        delay.delay_ms(config.servo_settle_ms);
        supervisor.report(HomingEvent::ServoCentered);

        supervisor.release();
        axis.enable(true);

        self.enter(HomingPhase::CheckingLimit, supervisor);
        let backed_off = limit.is_triggered();
        if backed_off {
            self.backoff(axis, limit, delay, supervisor)?;
        }

        let seek_steps = self.seek(axis, limit, delay, supervisor)?;
        self.fine_approach(axis, limit, delay, supervisor)?;

        self.enter(HomingPhase::Reset, supervisor);
        axis.reset_position();
        servo.set_angle(0.0);

        self.enter(HomingPhase::Ready, supervisor);
        Ok(HomingOutcome {
            seek_steps,
            backed_off,
        })
    }

    /// Step away from a switch that is already pressed
    fn backoff<S, L, D, H>(
        &mut self,
        axis: &mut HeightAxis<S>,
        limit: &mut L,
        delay: &mut D,
        supervisor: &mut H,
    ) -> Result<(), HomingError>
    where
        S: StepperDriver,
        L: LimitSwitch,
        D: DelayNs,
        H: HomingSupervisor,
    {
        self.enter(HomingPhase::Backoff, supervisor);
        axis.set_direction(Direction::Positive, delay);

        for _ in 0..self.config.backoff_max_steps {
            if supervisor.is_aborted() || supervisor.poll() {
                return Err(self.fail(
                    axis,
                    HomingError::Interrupted {
                        phase: HomingPhase::Backoff,
                    },
                ));
            }

            axis.pulse(self.config.backoff_half_period_us, delay);

            if !limit.is_triggered() {
                supervisor.report(HomingEvent::LimitCleared);
                break;
            }
        }

        delay.delay_ms(self.config.backoff_settle_ms);
        Ok(())
    }

    /// Travel toward the switch until it closes
    fn seek<S, L, D, H>(
        &mut self,
        axis: &mut HeightAxis<S>,
        limit: &mut L,
        delay: &mut D,
        supervisor: &mut H,
    ) -> Result<u32, HomingError>
    where
        S: StepperDriver,
        L: LimitSwitch,
        D: DelayNs,
        H: HomingSupervisor,
    {
        axis.set_direction(Direction::Negative, delay);
        self.enter(HomingPhase::SeekingLimit, supervisor);

        let step_ms = self.config.seek_step_ms();
        let report_interval = self.config.report_interval_steps.max(1);
        let steps_per_mm = axis.config().steps_per_mm;
        let mut steps = 0u32;
        let mut elapsed_ms = 0u32;

        while !limit.is_triggered() {
            if supervisor.is_aborted() || supervisor.poll() {
                return Err(self.fail(
                    axis,
                    HomingError::Interrupted {
                        phase: HomingPhase::SeekingLimit,
                    },
                ));
            }
            if elapsed_ms >= self.config.timeout_ms {
                return Err(self.fail(
                    axis,
                    HomingError::Timeout {
                        phase: HomingPhase::SeekingLimit,
                        steps,
                    },
                ));
            }

            axis.pulse(self.config.seek_half_period_us, delay);
            steps += 1;
            elapsed_ms = elapsed_ms.saturating_add(step_ms);

            if steps % report_interval == 0 {
                supervisor.report(HomingEvent::SeekProgress {
                    steps,
                    distance_mm: steps as f32 / steps_per_mm as f32,
                });
            }
        }

        Ok(steps)
    }

    /// Back off and re-approach the switch slowly
    ///
    /// Not abortable: the move is short and bounded.
    fn fine_approach<S, L, D, H>(
        &mut self,
        axis: &mut HeightAxis<S>,
        limit: &mut L,
        delay: &mut D,
        supervisor: &mut H,
    ) -> Result<(), HomingError>
    where
        S: StepperDriver,
        L: LimitSwitch,
        D: DelayNs,
        H: HomingSupervisor,
    {
        self.enter(HomingPhase::FineApproach, supervisor);
        let half_period = self.config.fine_half_period_us;

        axis.set_direction(Direction::Positive, delay);
        for _ in 0..self.config.fine_backoff_steps {
            axis.pulse(half_period, delay);
        }

        axis.set_direction(Direction::Negative, delay);
        let mut steps = 0u32;
        while !limit.is_triggered() {
            if steps >= self.config.fine_approach_max_steps {
                return Err(self.fail(
                    axis,
                    HomingError::Timeout {
                        phase: HomingPhase::FineApproach,
                        steps,
                    },
                ));
            }
            axis.pulse(half_period, delay);
            steps += 1;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AxisConfig, ServoConfig};
    use crate::testing::{sim_rig, AbortAfterPolls, MockDelay, MockPwm, SimStepper, SimSwitch};

    /// Supervisor recording events and delegating aborts
    struct Recorder {
        abort: AbortAfterPolls,
        released: bool,
        events: Vec<HomingEvent>,
    }

    impl Recorder {
        fn new(abort: AbortAfterPolls) -> Self {
            Self {
                abort,
                released: false,
                events: Vec::new(),
            }
        }

        fn phases(&self) -> Vec<HomingPhase> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    HomingEvent::Phase(p) => Some(*p),
                    _ => None,
                })
                .collect()
        }
    }

    impl AbortCheck for Recorder {
        fn is_aborted(&self) -> bool {
            self.abort.is_aborted()
        }

        fn poll(&mut self) -> bool {
            self.abort.poll()
        }
    }

    impl HomingSupervisor for Recorder {
        fn release(&mut self) {
            self.released = true;
        }

        fn report(&mut self, event: HomingEvent) {
            self.events.push(event);
        }
    }

    struct Rig {
        axis: HeightAxis<SimStepper>,
        servo: Servo<MockPwm>,
        switch: SimSwitch,
        delay: MockDelay,
    }

    fn rig(start: i32, trigger_at: Option<i32>) -> Rig {
        let (stepper, switch, _) = sim_rig(start, trigger_at);
        Rig {
            axis: HeightAxis::new(stepper, AxisConfig::default()),
            servo: Servo::new(MockPwm::default(), ServoConfig::default()),
            switch,
            delay: MockDelay::default(),
        }
    }

    fn run(rig: &mut Rig, recorder: &mut Recorder) -> Result<HomingOutcome, HomingError> {
        let mut homing = Homing::new(HomingConfig::default());
        homing.run(
            &mut rig.axis,
            &mut rig.servo,
            &mut rig.switch,
            &mut rig.delay,
            recorder,
        )
    }

    #[test]
    fn test_homes_from_below_switch() {
        let mut rig = rig(250, Some(0));
        let mut recorder = Recorder::new(AbortAfterPolls::never());
        rig.servo.set_angle(45.0);

        let outcome = run(&mut rig, &mut recorder).unwrap();
        assert_eq!(outcome.seek_steps, 250);
        assert!(!outcome.backed_off);
        assert!(recorder.released);

        assert_eq!(
            recorder.phases(),
            vec![
                HomingPhase::ServoCentering,
                HomingPhase::CheckingLimit,
                HomingPhase::SeekingLimit,
                HomingPhase::FineApproach,
                HomingPhase::Reset,
                HomingPhase::Ready,
            ]
        );
        assert_eq!(rig.axis.position_steps(), 0);
        assert_eq!(rig.servo.angle(), 0.0);
        assert_eq!(rig.servo.output().pulse_us, Some(1500));
        // Fine approach ends back on the switch edge
        assert_eq!(rig.switch.carriage.get(), 0);
    }

    #[test]
    fn test_seek_reports_progress() {
        let mut rig = rig(250, Some(0));
        let mut recorder = Recorder::new(AbortAfterPolls::never());
        run(&mut rig, &mut recorder).unwrap();

        let progress: Vec<_> = recorder
            .events
            .iter()
            .filter(|e| matches!(e, HomingEvent::SeekProgress { .. }))
            .collect();
        assert_eq!(progress.len(), 2);
        assert_eq!(
            *progress[1],
            HomingEvent::SeekProgress {
                steps: 200,
                distance_mm: 2.0
            }
        );
    }

    #[test]
    fn test_backs_off_pressed_switch() {
        let mut rig = rig(-3, Some(0));
        let mut recorder = Recorder::new(AbortAfterPolls::never());

        let outcome = run(&mut rig, &mut recorder).unwrap();
        assert!(outcome.backed_off);
        assert!(recorder.events.contains(&HomingEvent::LimitCleared));
        assert!(recorder.phases().contains(&HomingPhase::Backoff));
        // Cleared at 1, one seek step back to 0
        assert_eq!(outcome.seek_steps, 1);
    }

    #[test]
    fn test_timeout_when_switch_missing() {
        let mut rig = rig(0, None);
        let mut recorder = Recorder::new(AbortAfterPolls::never());

        let err = run(&mut rig, &mut recorder).unwrap_err();
        assert_eq!(
            err,
            HomingError::Timeout {
                phase: HomingPhase::SeekingLimit,
                steps: 15_000
            }
        );
        assert!(!rig.axis.is_enabled());
        assert_eq!(rig.axis.position_steps(), 0);
        assert_eq!(rig.axis.stepper().pulses, 15_000);
    }

    #[test]
    fn test_abort_during_seek() {
        let mut rig = rig(5000, Some(0));
        let mut recorder = Recorder::new(AbortAfterPolls::at_poll(10));

        let err = run(&mut rig, &mut recorder).unwrap_err();
        assert_eq!(
            err,
            HomingError::Interrupted {
                phase: HomingPhase::SeekingLimit
            }
        );
        assert_eq!(rig.axis.stepper().pulses, 9);
        assert!(!rig.axis.is_enabled());
    }

    #[test]
    fn test_abort_during_backoff() {
        let mut rig = rig(-100, Some(0));
        let mut recorder = Recorder::new(AbortAfterPolls::at_poll(3));

        let err = run(&mut rig, &mut recorder).unwrap_err();
        assert_eq!(
            err,
            HomingError::Interrupted {
                phase: HomingPhase::Backoff
            }
        );
        assert!(!rig.axis.is_enabled());
    }

    #[test]
    fn test_backoff_gives_up_after_limit() {
        // Switch stays pressed for more than the backoff budget
        let mut rig = rig(-1000, Some(0));
        let mut recorder = Recorder::new(AbortAfterPolls::never());

        let outcome = run(&mut rig, &mut recorder).unwrap();
        assert!(!recorder.events.contains(&HomingEvent::LimitCleared));
        // Still pressed, so the seek finds it immediately
        assert_eq!(outcome.seek_steps, 0);
    }

    #[test]
    fn test_servo_settles_before_motion() {
        let mut rig = rig(0, Some(0));
        let mut recorder = Recorder::new(AbortAfterPolls::never());
        run(&mut rig, &mut recorder).unwrap();
        assert!(rig.delay.elapsed_ms() >= 1000);
    }
}
