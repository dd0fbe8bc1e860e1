//! Command table and request parsing

use core::str;

/// Errors produced while parsing a request line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Line is not valid UTF-8
    InvalidEncoding,
    /// Command name is not in the command table
    UnknownCommand,
    /// Command needs parameters but none were given
    MissingParams,
    /// Parameter is not a number
    InvalidNumber,
    /// Pair parameter has no comma separator
    MissingSeparator,
}

/// Console commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Record a target height (mm), no motion
    SetHeight,
    /// Record a target angle (degrees), no motion
    SetAngle,
    /// Move the height axis then the servo
    MoveTo,
    /// Mark the system ready
    Stop,
    /// Latch the emergency stop and disable the stepper
    EmergencyStop,
    /// Clear the emergency stop and return to Ready
    Reset,
    /// Return to the zero position
    Home,
    /// Full limit-switch homing sequence
    InitHome,
    /// Report the limit switch level
    CheckLimit,
    GetStatus,
    GetSensors,
    Test,
    Echo,
    Version,
    Help,
    DebugOn,
    DebugOff,
}

/// Number of commands in the table
pub const COMMAND_COUNT: usize = 17;

const COMMAND_TABLE: [(&str, Command); COMMAND_COUNT] = [
    ("SET_HEIGHT", Command::SetHeight),
    ("SET_ANGLE", Command::SetAngle),
    ("MOVE_TO", Command::MoveTo),
    ("STOP", Command::Stop),
    ("EMERGENCY_STOP", Command::EmergencyStop),
    ("RESET", Command::Reset),
    ("HOME", Command::Home),
    ("INIT_HOME", Command::InitHome),
    ("CHECK_LIMIT", Command::CheckLimit),
    ("GET_STATUS", Command::GetStatus),
    ("GET_SENSORS", Command::GetSensors),
    ("TEST", Command::Test),
    ("ECHO", Command::Echo),
    ("VERSION", Command::Version),
    ("HELP", Command::Help),
    ("DEBUG_ON", Command::DebugOn),
    ("DEBUG_OFF", Command::DebugOff),
];

impl Command {
    /// Look up a command by its exact wire name
    pub fn from_name(name: &str) -> Option<Self> {
        COMMAND_TABLE
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, cmd)| *cmd)
    }

    /// Wire name of this command
    pub fn name(self) -> &'static str {
        match self {
            Command::SetHeight => "SET_HEIGHT",
            Command::SetAngle => "SET_ANGLE",
            Command::MoveTo => "MOVE_TO",
            Command::Stop => "STOP",
            Command::EmergencyStop => "EMERGENCY_STOP",
            Command::Reset => "RESET",
            Command::Home => "HOME",
            Command::InitHome => "INIT_HOME",
            Command::CheckLimit => "CHECK_LIMIT",
            Command::GetStatus => "GET_STATUS",
            Command::GetSensors => "GET_SENSORS",
            Command::Test => "TEST",
            Command::Echo => "ECHO",
            Command::Version => "VERSION",
            Command::Help => "HELP",
            Command::DebugOn => "DEBUG_ON",
            Command::DebugOff => "DEBUG_OFF",
        }
    }

    /// Whether the command is rejected without a `:params` part
    pub fn requires_params(self) -> bool {
        matches!(
            self,
            Command::SetHeight | Command::SetAngle | Command::MoveTo | Command::Echo
        )
    }

    /// Whether the command is refused while the emergency stop is latched
    ///
    /// `HOME` and `INIT_HOME` clear the latch themselves.
    pub fn blocked_by_emergency_stop(self) -> bool {
        matches!(
            self,
            Command::SetHeight | Command::SetAngle | Command::MoveTo
        )
    }

    /// All commands in table order
    pub fn all() -> impl Iterator<Item = Command> {
        COMMAND_TABLE.iter().map(|(_, cmd)| *cmd)
    }
}

/// A parsed request line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a> {
    pub command: Command,
    /// Text after the first `:`, if any (may be empty)
    pub params: Option<&'a str>,
}

impl<'a> Request<'a> {
    /// Parameters, or `MissingParams` if the request had none
    pub fn require_params(&self) -> Result<&'a str, ParseError> {
        self.params.ok_or(ParseError::MissingParams)
    }
}

/// Split a raw line into command name and optional params
///
/// Leading spaces are stripped. The name ends at the first `:`.
pub fn split_line(line: &[u8]) -> Result<(&str, Option<&str>), ParseError> {
    let text = str::from_utf8(line).map_err(|_| ParseError::InvalidEncoding)?;
    let text = text.trim_start_matches(' ');
    Ok(match text.split_once(':') {
        Some((name, params)) => (name, Some(params)),
        None => (text, None),
    })
}

/// Parse a complete line into a request
pub fn parse_line(line: &[u8]) -> Result<Request<'_>, ParseError> {
    let (name, params) = split_line(line)?;
    let command = Command::from_name(name).ok_or(ParseError::UnknownCommand)?;

    if command.requires_params() && params.is_none() {
        return Err(ParseError::MissingParams);
    }

    Ok(Request { command, params })
}

/// Parse a single decimal parameter
///
/// Surrounding whitespace is allowed; anything else that is not a number
/// is rejected.
pub fn parse_float(param: &str) -> Result<f32, ParseError> {
    param
        .trim()
        .parse::<f32>()
        .map_err(|_| ParseError::InvalidNumber)
}

/// Parse a `first,second` decimal pair
pub fn parse_pair(param: &str) -> Result<(f32, f32), ParseError> {
    let (first, second) = param.split_once(',').ok_or(ParseError::MissingSeparator)?;
    Ok((parse_float(first)?, parse_float(second)?))
}
