//! CDC Control serial command protocol
//!
//! The controller is driven over a line-oriented ASCII console. Each request
//! is a single line terminated by `\r` or `\n`:
//!
//! ```text
//! COMMAND[:PARAMS]\r\n
//! ```
//!
//! Commands are matched exactly and case-sensitively. Every request produces
//! one response line, or a short sequence of `INFO:` lines followed by a
//! final `OK:`/`ERROR:` line for long-running operations. Responses are
//! terminated with `\r\n`.
//!
//! This crate holds the wire-level pieces only: line assembly, request
//! parsing and response formatting. Dispatch lives in `cdc-core`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod line;
pub mod response;

pub use command::{parse_float, parse_line, parse_pair, Command, ParseError, Request};
pub use line::{LineBuffer, LINE_CAPACITY};
pub use response::{
    format_line, ErrorCode, ReportedState, ResponseLine, SensorReport, StatusReport,
    BANNER_RULE, HELP_LINES, LINE_END, VERSION_REPLY,
};
