//! Command controller
//!
//! Owns every actuator, sensor and piece of supervisory state. The board
//! loop feeds it console bytes through [`Controller::poll`]; each completed
//! line is parsed, dispatched, and answered before the next byte is read.
//!
//! Long operations (`MOVE_TO`, `HOME`, `INIT_HOME`) keep the console
//! borrowed through a [`Session`] so the abort token can be detected while
//! they run.

use core::fmt;

use cdc_protocol::{
    format_line, parse_float, parse_line, parse_pair, Command, ErrorCode, LineBuffer,
    ParseError, ReportedState, Request, SensorReport, StatusReport, BANNER_RULE, HELP_LINES,
    LINE_END, VERSION_REPLY,
};
use embedded_hal::delay::DelayNs;

use crate::config::MachineConfig;
use crate::homing::{Homing, HomingError, HomingEvent, HomingPhase, HomingSupervisor};
use crate::motion::{HeightAxis, MoveOutcome, Servo};
use crate::safety::{AbortCheck, EmergencyStop};
use crate::state::{Event, SystemStatus};
use crate::traits::{
    Console, LimitSwitch, RangeSensor, ServoOutput, StepperDriver, TemperatureSensor,
};

#[cfg(feature = "defmt")]
use defmt::{debug, info, warn};

// Stub macros when defmt is not available
#[cfg(not(feature = "defmt"))]
macro_rules! warn {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "defmt"))]
macro_rules! info {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "defmt"))]
macro_rules! debug {
    ($($arg:tt)*) => {{}};
}

/// Firmware identification printed in the banner
pub const FIRMWARE_NAME: &str = "CDC Control System v1.0";

/// Hardware handed to the controller at startup
pub struct Hardware<S, V, L, T, R, C, D> {
    pub stepper: S,
    pub servo: V,
    pub limit: L,
    pub thermometer: T,
    pub ranger: R,
    pub console: C,
    pub delay: D,
}

fn write_line<C: Console>(console: &mut C, text: &str) {
    console.write_str(text);
    console.write_str(LINE_END);
}

fn write_fmt_line<C: Console>(console: &mut C, args: fmt::Arguments<'_>) {
    write_line(console, format_line(args).as_str());
}

/// Console and emergency-stop latch lent to a long-running operation
pub struct Session<'a, C> {
    estop: &'a mut EmergencyStop,
    console: &'a mut C,
}

impl<'a, C: Console> Session<'a, C> {
    pub fn new(estop: &'a mut EmergencyStop, console: &'a mut C) -> Self {
        Self { estop, console }
    }
}

impl<C: Console> AbortCheck for Session<'_, C> {
    fn is_aborted(&self) -> bool {
        self.estop.is_active()
    }

    fn poll(&mut self) -> bool {
        if self.estop.scan(&mut *self.console) {
            warn!("abort token received during operation");
            write_line(&mut *self.console, "INFO:Emergency detected during move");
        }
        self.estop.is_active()
    }
}

impl<C: Console> HomingSupervisor for Session<'_, C> {
    fn release(&mut self) {
        self.estop.clear();
    }

    fn report(&mut self, event: HomingEvent) {
        let console = &mut *self.console;
        match event {
            HomingEvent::Phase(HomingPhase::ServoCentering) => {
                write_line(console, "INFO:Starting safe homing sequence...");
                write_line(
                    console,
                    "INFO:Step 1 - Setting servo to center position (0 degrees)...",
                );
            }
            HomingEvent::ServoCentered => {
                write_line(console, "OK:Servo centered at 0 degrees");
            }
            HomingEvent::Phase(HomingPhase::CheckingLimit) => {
                write_line(console, "INFO:Step 2 - Checking limit switch status...");
            }
            HomingEvent::Phase(HomingPhase::Backoff) => {
                write_line(console, "INFO:Already at home position, backing off...");
            }
            HomingEvent::LimitCleared => {
                write_line(console, "INFO:Cleared limit switch");
            }
            HomingEvent::Phase(HomingPhase::SeekingLimit) => {
                write_line(console, "INFO:Step 3 - Moving up to find limit switch...");
                write_line(console, "INFO:Please ensure area is clear!");
            }
            HomingEvent::SeekProgress { steps, distance_mm } => {
                write_fmt_line(
                    console,
                    format_args!("INFO:Homing... {} steps ({:.1} mm)", steps, distance_mm),
                );
            }
            HomingEvent::Phase(HomingPhase::FineApproach) => {
                write_line(console, "INFO:Step 4 - Limit switch detected, fine-tuning...");
            }
            HomingEvent::Phase(_) => {}
        }
    }
}

/// Motion and sensor command controller
pub struct Controller<S, V, L, T, R, C, D> {
    config: MachineConfig,
    axis: HeightAxis<S>,
    servo: Servo<V>,
    limit: L,
    thermometer: T,
    ranger: R,
    console: C,
    delay: D,
    homing: Homing,
    estop: EmergencyStop,
    status: SystemStatus,
    line: LineBuffer,
    target_height_mm: f32,
    target_angle_deg: f32,
    last_temperature_c: f32,
    last_range_mm: u8,
    debug: bool,
}

impl<S, V, L, T, R, C, D> Controller<S, V, L, T, R, C, D>
where
    S: StepperDriver,
    V: ServoOutput,
    L: LimitSwitch,
    T: TemperatureSensor,
    R: RangeSensor,
    C: Console,
    D: DelayNs,
{
    /// Take ownership of the hardware and put it in the home state
    ///
    /// The stepper is enabled at position zero and the servo is centered.
    pub fn new(config: MachineConfig, hw: Hardware<S, V, L, T, R, C, D>) -> Self {
        let axis = HeightAxis::new(hw.stepper, config.axis);
        let mut servo = Servo::new(hw.servo, config.servo);
        servo.set_angle(0.0);

        Self {
            config,
            axis,
            servo,
            limit: hw.limit,
            thermometer: hw.thermometer,
            ranger: hw.ranger,
            console: hw.console,
            delay: hw.delay,
            homing: Homing::new(config.homing),
            estop: EmergencyStop::new(),
            status: SystemStatus::Ready,
            line: LineBuffer::new(),
            target_height_mm: 0.0,
            target_angle_deg: 0.0,
            last_temperature_c: config.sensors.temperature_fallback_c,
            last_range_mm: config.sensors.range_fallback_mm,
            debug: config.console.debug,
        }
    }

    /// Print the startup banner if enabled
    pub fn start(&mut self) {
        info!("controller ready, debug={}", self.debug);
        if !self.config.console.banner {
            return;
        }
        self.reply(BANNER_RULE);
        self.reply(FIRMWARE_NAME);
        self.reply(if self.debug {
            "Debug Mode: ON"
        } else {
            "Debug Mode: OFF"
        });
        self.reply("Type 'HELP' for command list");
        self.reply("Ready for commands");
        self.reply(BANNER_RULE);
    }

    /// Process at most one pending console byte
    ///
    /// Returns false when no input was waiting.
    pub fn poll(&mut self) -> bool {
        let Some(byte) = self.console.read_byte() else {
            return false;
        };
        if self.estop.discard(byte) {
            return true;
        }
        if let Some(line) = self.line.feed(byte) {
            self.handle_line(&line);
        }
        true
    }

    /// Process all pending console input
    pub fn poll_all(&mut self) {
        while self.poll() {}
    }

    /// Parse and execute one complete command line
    pub fn handle_line(&mut self, line: &[u8]) {
        if self.debug {
            let text = core::str::from_utf8(line).unwrap_or("<invalid>");
            self.debug_line(format_args!(
                "Received command: [{}] (length: {})",
                text,
                line.len()
            ));
            if let Ok((name, params)) = cdc_protocol::command::split_line(line) {
                match params {
                    Some(params) => self.debug_line(format_args!(
                        "Command: [{}], Params: [{}]",
                        name, params
                    )),
                    None => self.debug_line(format_args!("Command: [{}], No params", name)),
                }
            }
        }

        match parse_line(line) {
            Ok(request) => self.dispatch(request),
            Err(err) => {
                debug!("rejected line: {}", err);
                if err == ParseError::UnknownCommand && self.debug {
                    let name = cdc_protocol::command::split_line(line)
                        .map(|(name, _)| name)
                        .unwrap_or("");
                    self.debug_line(format_args!("Unknown command: [{}]", name));
                }
                self.reply_error(ErrorCode::InvalidCommand);
            }
        }
    }

    fn dispatch(&mut self, request: Request<'_>) {
        debug!("dispatch {}", request.command);
        if request.command.blocked_by_emergency_stop() && self.estop.is_active() {
            return self.reply_error(ErrorCode::EmergencyStopActive);
        }
        match request.command {
            Command::SetHeight => self.set_height(request),
            Command::SetAngle => self.set_angle(request),
            Command::MoveTo => self.move_to(request),
            Command::Stop => self.stop(),
            Command::EmergencyStop => self.emergency_stop(),
            Command::Reset => self.reset(),
            Command::Home => self.home(),
            Command::InitHome => self.init_home(),
            Command::CheckLimit => self.check_limit(),
            Command::GetStatus => self.get_status(),
            Command::GetSensors => self.get_sensors(),
            Command::Test => {
                self.debug_line(format_args!("TEST command received - system is responding"));
                self.reply("TEST_OK:System is working");
            }
            Command::Echo => {
                let text = request.params.unwrap_or("");
                self.reply_fmt(format_args!("ECHO:{}", text));
            }
            Command::Version => self.reply(VERSION_REPLY),
            Command::Help => {
                for line in HELP_LINES {
                    self.reply(line);
                }
            }
            Command::DebugOn => {
                self.debug = true;
                self.reply("Debug mode ON");
            }
            Command::DebugOff => {
                self.debug = false;
                self.reply("Debug mode OFF");
            }
        }
    }

    fn set_height(&mut self, request: Request<'_>) {
        match request.require_params().and_then(parse_float) {
            Err(_) => self.reply_error(ErrorCode::InvalidCommand),
            Ok(height) if !self.config.axis.height_in_range(height) => {
                self.reply_error(ErrorCode::OutOfRange)
            }
            Ok(height) => {
                self.target_height_mm = height;
                self.reply("OK");
            }
        }
    }

    fn set_angle(&mut self, request: Request<'_>) {
        match request.require_params().and_then(parse_float) {
            Err(_) => self.reply_error(ErrorCode::InvalidCommand),
            Ok(angle) if !self.config.servo.angle_in_range(angle) => {
                self.reply_error(ErrorCode::OutOfRange)
            }
            Ok(angle) => {
                self.target_angle_deg = angle;
                self.reply("OK");
            }
        }
    }

    fn move_to(&mut self, request: Request<'_>) {
        let (height, angle) = match request.require_params().and_then(parse_pair) {
            Ok(pair) => pair,
            Err(_) => return self.reply_error(ErrorCode::InvalidCommand),
        };
        if !self.config.axis.height_in_range(height) || !self.config.servo.angle_in_range(angle)
        {
            return self.reply_error(ErrorCode::OutOfRange);
        }

        self.target_height_mm = height;
        self.target_angle_deg = angle;
        self.transition(Event::MoveStarted);

        let mut session = Session::new(&mut self.estop, &mut self.console);
        let outcome = self
            .axis
            .move_to_height(height, &mut self.delay, &mut session);
        // Servo writes are atomic and not gated by the abort latch
        self.servo.set_angle(angle);

        match outcome {
            MoveOutcome::Completed { .. } => {
                self.transition(Event::MoveCompleted);
                self.reply("OK");
            }
            MoveOutcome::Aborted {
                completed,
                requested,
            } => {
                warn!("move aborted after {} of {} steps", completed, requested);
                self.reply_fmt(format_args!(
                    "INFO:Stopped at step {} of {}",
                    completed.unsigned_abs(),
                    requested.unsigned_abs()
                ));
                self.reply_fmt(format_args!("INFO:Position: {:.1} mm", self.axis.height_mm()));
                self.transition(Event::MoveAborted);
                self.reply_error(ErrorCode::MovementInterrupted);
            }
        }
    }

    fn stop(&mut self) {
        self.transition(Event::Stop);
        self.reply("OK");
    }

    fn emergency_stop(&mut self) {
        self.estop.trip();
        self.axis.enable(false);
        self.transition(Event::EmergencyStop);
        warn!("emergency stop latched");
        self.reply("OK:EMERGENCY_STOP");
        self.debug_line(format_args!(
            "EMERGENCY STOP ACTIVATED - All motors disabled"
        ));
    }

    fn reset(&mut self) {
        self.estop.clear();
        self.axis.enable(true);
        self.transition(Event::Reset);
        info!("emergency stop cleared");
        self.reply("OK:System reset");
    }

    fn home(&mut self) {
        if self.estop.is_active() {
            self.reply("INFO:Clearing emergency stop");
            self.estop.clear();
            self.axis.enable(true);
            self.delay.delay_ms(self.config.homing.reenable_settle_ms);
            self.reply("INFO:Motors re-enabled");
        } else {
            self.axis.enable(true);
        }

        self.transition(Event::HomingStarted);
        self.reply("INFO:Homing started");
        self.servo.set_angle(0.0);

        let mut session = Session::new(&mut self.estop, &mut self.console);
        let outcome = if session.poll() {
            None
        } else {
            Some(self.axis.move_to_height(0.0, &mut self.delay, &mut session))
        };

        match outcome {
            Some(MoveOutcome::Completed { .. }) => {
                self.axis.reset_position();
                self.transition(Event::HomingCompleted);
                self.reply("OK:HOME");
            }
            _ => {
                self.axis.enable(false);
                self.transition(Event::HomingFailed);
                self.reply("ERROR:Homing interrupted");
            }
        }
    }

    fn init_home(&mut self) {
        self.transition(Event::HomingStarted);

        let mut session = Session::new(&mut self.estop, &mut self.console);
        let result = self.homing.run(
            &mut self.axis,
            &mut self.servo,
            &mut self.limit,
            &mut self.delay,
            &mut session,
        );
        self.debug_line(format_args!("Homing phase: {:?}", self.homing.phase()));

        match result {
            Ok(outcome) => {
                info!("homed after {} seek steps", outcome.seek_steps);
                self.debug_line(format_args!(
                    "Limit switch found after {} steps",
                    outcome.seek_steps
                ));
                self.target_height_mm = 0.0;
                self.target_angle_deg = 0.0;
                self.transition(Event::HomingCompleted);
                self.reply(BANNER_RULE);
                self.reply("OK:Homing complete!");
                self.reply("  - Servo angle: 0.0 degrees");
                self.reply("  - Height: 0.0 mm (at limit switch)");
                self.reply("  - System ready for operation");
                self.reply(BANNER_RULE);
            }
            Err(err) => {
                warn!("homing failed: {}", err);
                self.transition(Event::HomingFailed);
                match err {
                    HomingError::Interrupted {
                        phase: HomingPhase::Backoff,
                    } => self.reply("ERROR:Homing interrupted"),
                    HomingError::Interrupted { .. } => {
                        self.reply("ERROR:Homing interrupted by emergency stop")
                    }
                    HomingError::Timeout { .. } => {
                        self.reply("ERROR:Homing timeout - limit switch not found");
                        self.reply("INFO:Check limit switch connection");
                    }
                }
            }
        }
    }

    fn check_limit(&mut self) {
        if self.limit.is_triggered() {
            self.reply("INFO:Limit switch is TRIGGERED");
        } else {
            self.reply("INFO:Limit switch is RELEASED");
        }
    }

    fn get_status(&mut self) {
        let report = StatusReport {
            state: self.reported_state(),
            height_mm: self.axis.height_mm(),
            angle_deg: self.servo.angle(),
        };
        self.reply_fmt(format_args!("{}", report));
    }

    fn get_sensors(&mut self) {
        match self.ranger.read_range_mm() {
            Ok(range) => self.last_range_mm = range,
            Err(err) => {
                debug!("range read failed: {}", err);
                self.debug_line(format_args!(
                    "Distance sensor read failed ({:?}), using default",
                    err
                ));
            }
        }
        match self.thermometer.read_celsius() {
            Ok(celsius) => self.last_temperature_c = celsius,
            Err(err) => {
                debug!("temperature read failed: {}", err);
                self.debug_line(format_args!(
                    "Temperature sensor read failed ({:?}), using last value",
                    err
                ));
            }
        }

        let sensors = &self.config.sensors;
        let range = self.last_range_mm as u16;
        let [aux1, aux2] = sensors.auxiliary_distances_mm;
        let report = SensorReport {
            distances_mm: [range, range + 1, aux1, aux2],
            temperature_c: self.last_temperature_c,
            angle_deg: self.servo.angle(),
            capacitance_pf: sensors.capacitance_base_pf
                + self.axis.height_mm() * sensors.capacitance_per_mm,
        };

        let line = format_line(format_args!("{}", report));
        self.debug_line(format_args!("Sending sensor data: {}", line.as_str()));
        self.reply(line.as_str());
    }

    fn transition(&mut self, event: Event) {
        let next = self.status.transition(event);
        if next != self.status {
            debug!("status {} -> {}", self.status, next);
        }
        self.status = next;
    }

    fn reply(&mut self, text: &str) {
        write_line(&mut self.console, text);
    }

    fn reply_fmt(&mut self, args: fmt::Arguments<'_>) {
        write_fmt_line(&mut self.console, args);
    }

    fn reply_error(&mut self, code: ErrorCode) {
        self.reply_fmt(format_args!("{}", code));
    }

    /// Emit a `[DEBUG]` console line when debug mode is on
    fn debug_line(&mut self, args: fmt::Arguments<'_>) {
        if !self.debug {
            return;
        }
        self.console.write_str("[DEBUG] ");
        write_fmt_line(&mut self.console, args);
    }

    /// Current supervisory status
    pub fn status(&self) -> SystemStatus {
        self.status
    }

    /// State as reported by `GET_STATUS`
    pub fn reported_state(&self) -> ReportedState {
        self.status.reported(self.estop.is_active())
    }

    pub fn is_emergency_stopped(&self) -> bool {
        self.estop.is_active()
    }

    pub fn height_mm(&self) -> f32 {
        self.axis.height_mm()
    }

    pub fn position_steps(&self) -> i32 {
        self.axis.position_steps()
    }

    pub fn angle_deg(&self) -> f32 {
        self.servo.angle()
    }

    pub fn target_height_mm(&self) -> f32 {
        self.target_height_mm
    }

    pub fn target_angle_deg(&self) -> f32 {
        self.target_angle_deg
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn axis(&self) -> &HeightAxis<S> {
        &self.axis
    }

    pub fn servo(&self) -> &Servo<V> {
        &self.servo
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }
}
