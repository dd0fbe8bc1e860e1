//! Response formatting
//!
//! Responses are plain ASCII lines. Numeric fields are printed with one
//! decimal place.

use core::fmt::{self, Write};

use heapless::String;

/// Line terminator appended to every response
pub const LINE_END: &str = "\r\n";

/// Maximum length of a single formatted response line
///
/// Large enough for a debug echo of a full 127-character command line.
pub const RESPONSE_CAPACITY: usize = 192;

/// A formatted response line, without terminator
pub type ResponseLine = String<RESPONSE_CAPACITY>;

/// Reply to `VERSION`
pub const VERSION_REPLY: &str = "VERSION:CDC_Control_v1.0";

/// Separator line used around the boot banner and homing report
pub const BANNER_RULE: &str = "=====================================";

/// Reply to `HELP`, one entry per line
pub const HELP_LINES: &[&str] = &[
    "Commands:",
    "  INIT_HOME - Initialize home position using limit switch",
    "  CHECK_LIMIT - Check limit switch status",
    "  GET_STATUS - Get system status",
    "  GET_SENSORS - Get sensor readings",
    "  SET_HEIGHT:value - Set target height",
    "  SET_ANGLE:value - Set target angle",
    "  MOVE_TO:height,angle - Move to position",
    "  HOME - Return to home position",
    "  STOP - Stop current movement",
    "  EMERGENCY_STOP - Emergency stop",
    "  RESET - Clear emergency stop",
    "  TEST - Test connection",
    "  ECHO:text - Echo back text",
    "  VERSION - Get version",
    "  DEBUG_ON/DEBUG_OFF - Toggle debug",
];

/// Error codes reported as `ERROR:<code>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorCode {
    /// Unknown command, missing or malformed parameters
    InvalidCommand,
    /// Parameter outside the allowed range
    OutOfRange,
    /// Motion refused while the emergency stop is latched
    EmergencyStopActive,
    /// Move aborted by an emergency stop
    MovementInterrupted,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidCommand => "INVALID_COMMAND",
            ErrorCode::OutOfRange => "OUT_OF_RANGE",
            ErrorCode::EmergencyStopActive => "EMERGENCY_STOP_ACTIVE",
            ErrorCode::MovementInterrupted => "MOVEMENT_INTERRUPTED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ERROR:{}", self.as_str())
    }
}

/// System state as reported by `GET_STATUS`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportedState {
    Ready,
    Moving,
    Error,
    Homing,
    /// Emergency stop latched (overrides the supervisory status)
    EmergencyStop,
}

impl ReportedState {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportedState::Ready => "READY",
            ReportedState::Moving => "MOVING",
            ReportedState::Error => "ERROR",
            ReportedState::Homing => "HOMING",
            ReportedState::EmergencyStop => "EMERGENCY_STOP",
        }
    }
}

/// `STATUS:<state>,<height>,<angle>`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusReport {
    pub state: ReportedState,
    pub height_mm: f32,
    pub angle_deg: f32,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "STATUS:{},{:.1},{:.1}",
            self.state.as_str(),
            self.height_mm,
            self.angle_deg
        )
    }
}

/// `SENSORS:d1,d2,d3,d4,temp,angle,cap`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReport {
    /// Distance channels in millimeters
    pub distances_mm: [u16; 4],
    pub temperature_c: f32,
    pub angle_deg: f32,
    pub capacitance_pf: f32,
}

impl fmt::Display for SensorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [d1, d2, d3, d4] = self.distances_mm;
        write!(
            f,
            "SENSORS:{}.0,{}.0,{}.0,{}.0,{:.1},{:.1},{:.1}",
            d1, d2, d3, d4, self.temperature_c, self.angle_deg, self.capacitance_pf
        )
    }
}

/// Format a response line into a fixed-capacity string
///
/// Output beyond [`RESPONSE_CAPACITY`] is truncated.
pub fn format_line(args: fmt::Arguments<'_>) -> ResponseLine {
    let mut line = ResponseLine::new();
    let _ = line.write_fmt(args);
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let line = format_line(format_args!("{}", ErrorCode::EmergencyStopActive));
        assert_eq!(line.as_str(), "ERROR:EMERGENCY_STOP_ACTIVE");
        let line = format_line(format_args!("{}", ErrorCode::InvalidCommand));
        assert_eq!(line.as_str(), "ERROR:INVALID_COMMAND");
    }

    #[test]
    fn test_status_report_home() {
        let report = StatusReport {
            state: ReportedState::Ready,
            height_mm: 0.0,
            angle_deg: 0.0,
        };
        let line = format_line(format_args!("{}", report));
        assert_eq!(line.as_str(), "STATUS:READY,0.0,0.0");
    }

    #[test]
    fn test_status_report_rounds_to_one_decimal() {
        let report = StatusReport {
            state: ReportedState::EmergencyStop,
            height_mm: 12.34,
            angle_deg: -45.06,
        };
        let line = format_line(format_args!("{}", report));
        assert_eq!(line.as_str(), "STATUS:EMERGENCY_STOP,12.3,-45.1");
    }

    #[test]
    fn test_sensor_report() {
        let report = SensorReport {
            distances_mm: [12, 13, 156, 157],
            temperature_c: 25.0,
            angle_deg: 30.0,
            capacitance_pf: 145.5,
        };
        let line = format_line(format_args!("{}", report));
        assert_eq!(
            line.as_str(),
            "SENSORS:12.0,13.0,156.0,157.0,25.0,30.0,145.5"
        );
    }

    #[test]
    fn test_format_line_truncates() {
        let long = [b'x'; 300];
        let text = core::str::from_utf8(&long).unwrap();
        let line = format_line(format_args!("ECHO:{}", text));
        assert!(line.len() <= RESPONSE_CAPACITY);
    }

    #[test]
    fn test_full_line_echo_not_truncated() {
        let long = [b'C'; 127];
        let text = core::str::from_utf8(&long).unwrap();
        let line = format_line(format_args!(
            "Received command: [{}] (length: {})",
            text,
            long.len()
        ));
        assert!(line.ends_with("] (length: 127)"));
    }

    #[test]
    fn test_help_starts_with_header() {
        assert_eq!(HELP_LINES[0], "Commands:");
        assert!(HELP_LINES.iter().any(|l| l.contains("RESET")));
    }
}
