//! Host-side test doubles shared by the unit tests

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::safety::AbortCheck;
use crate::traits::{
    Console, Direction, LimitSwitch, RangeSensor, SensorError, ServoOutput, StepperDriver,
    TemperatureSensor,
};

/// Delay that only accumulates elapsed time
#[derive(Debug, Default)]
pub struct MockDelay {
    pub elapsed_ns: u64,
}

impl MockDelay {
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ns / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += ns as u64;
    }
}

/// Step/dir driver moving a simulated carriage
///
/// Each rising step edge while enabled moves the shared carriage one step.
#[derive(Debug)]
pub struct SimStepper {
    pub carriage: Rc<Cell<i32>>,
    pub dir: Direction,
    pub enabled: bool,
    pub step_high: bool,
    pub pulses: u32,
}

impl SimStepper {
    pub fn new(carriage: Rc<Cell<i32>>) -> Self {
        Self {
            carriage,
            dir: Direction::Positive,
            enabled: false,
            step_high: false,
            pulses: 0,
        }
    }
}

impl StepperDriver for SimStepper {
    fn set_direction(&mut self, dir: Direction) {
        self.dir = dir;
    }

    fn direction(&self) -> Direction {
        self.dir
    }

    fn enable(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_step(&mut self, high: bool) {
        if high && !self.step_high {
            self.pulses += 1;
            if self.enabled {
                self.carriage.set(self.carriage.get() + self.dir.sign());
            }
        }
        self.step_high = high;
    }
}

/// Limit switch pressed when the carriage is at or beyond `trigger_at`
#[derive(Debug)]
pub struct SimSwitch {
    pub carriage: Rc<Cell<i32>>,
    /// None simulates a disconnected switch
    pub trigger_at: Option<i32>,
}

impl LimitSwitch for SimSwitch {
    fn is_triggered(&mut self) -> bool {
        match self.trigger_at {
            Some(at) => self.carriage.get() <= at,
            None => false,
        }
    }
}

/// Stepper and limit switch sharing one carriage
pub fn sim_rig(start: i32, trigger_at: Option<i32>) -> (SimStepper, SimSwitch, Rc<Cell<i32>>) {
    let carriage = Rc::new(Cell::new(start));
    (
        SimStepper::new(carriage.clone()),
        SimSwitch {
            carriage: carriage.clone(),
            trigger_at,
        },
        carriage,
    )
}

/// PWM output recording the last pulse
#[derive(Debug, Default)]
pub struct MockPwm {
    pub pulse_us: Option<u16>,
}

impl ServoOutput for MockPwm {
    fn set_pulse_width_us(&mut self, pulse_us: u16) {
        self.pulse_us = Some(pulse_us);
    }
}

/// Console with scripted input and captured output
#[derive(Debug, Default)]
pub struct MockConsole {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    /// Input that arrives after a number of reads found nothing pending
    pub delayed: Option<(u32, Vec<u8>)>,
}

impl MockConsole {
    pub fn push_input(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Deliver `bytes` once `empty_reads` reads have returned nothing
    pub fn push_delayed(&mut self, empty_reads: u32, bytes: &[u8]) {
        self.delayed = Some((empty_reads, bytes.to_vec()));
    }

    /// Captured output split into lines
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.tx)
            .split("\r\n")
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn take_lines(&mut self) -> Vec<String> {
        let lines = self.lines();
        self.tx.clear();
        lines
    }
}

impl Console for MockConsole {
    fn read_byte(&mut self) -> Option<u8> {
        if self.rx.is_empty() {
            match self.delayed.take() {
                Some((0, bytes)) => self.rx.extend(bytes),
                Some((n, bytes)) => {
                    self.delayed = Some((n - 1, bytes));
                    return None;
                }
                None => return None,
            }
        }
        self.rx.pop_front()
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.tx.extend_from_slice(bytes);
    }
}

/// Temperature sensor returning scripted results
#[derive(Debug)]
pub struct MockThermometer {
    pub reading: Result<f32, SensorError>,
}

impl TemperatureSensor for MockThermometer {
    fn read_celsius(&mut self) -> Result<f32, SensorError> {
        self.reading
    }
}

/// Range sensor returning scripted results
#[derive(Debug)]
pub struct MockRanger {
    pub reading: Result<u8, SensorError>,
}

impl RangeSensor for MockRanger {
    fn read_range_mm(&mut self) -> Result<u8, SensorError> {
        self.reading
    }
}

/// Abort check that latches on the n-th poll
#[derive(Debug)]
pub struct AbortAfterPolls {
    pub polls: u32,
    pub trip_at: Option<u32>,
    pub aborted: bool,
}

impl AbortAfterPolls {
    pub fn never() -> Self {
        Self {
            polls: 0,
            trip_at: None,
            aborted: false,
        }
    }

    pub fn at_poll(n: u32) -> Self {
        Self {
            polls: 0,
            trip_at: Some(n),
            aborted: false,
        }
    }
}

impl AbortCheck for AbortAfterPolls {
    fn is_aborted(&self) -> bool {
        self.aborted
    }

    fn poll(&mut self) -> bool {
        self.polls += 1;
        if Some(self.polls) == self.trip_at {
            self.aborted = true;
        }
        self.aborted
    }
}
