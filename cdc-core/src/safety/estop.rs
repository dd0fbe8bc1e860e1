//! Emergency stop latch and abort token scanner

use crate::traits::Console;

/// Token that aborts a running operation when seen on the console
pub const ABORT_TOKEN: &[u8] = b"EMERGENCY";

/// Maximum bytes drained from the console per scan
pub const MAX_SCAN_BYTES: usize = 64;

const TOKEN_LEN: usize = 9;

/// Cooperative abort check used by long-running actuator loops
///
/// Loops call [`is_aborted`](AbortCheck::is_aborted) before every
/// discrete motion unit and [`poll`](AbortCheck::poll) at their
/// configured scan interval.
pub trait AbortCheck {
    /// Check if the emergency stop is latched
    fn is_aborted(&self) -> bool;

    /// Scan newly arrived input for an abort request
    ///
    /// Returns true if the emergency stop is latched after the scan.
    fn poll(&mut self) -> bool;
}

/// Streaming matcher for [`ABORT_TOKEN`]
///
/// Keeps the last few bytes seen so a token split across two reads is
/// still detected.
#[derive(Debug, Clone, Default)]
pub struct AbortScanner {
    window: [u8; TOKEN_LEN],
    filled: usize,
}

impl AbortScanner {
    /// Create a scanner with an empty window
    pub fn new() -> Self {
        Self {
            window: [0; TOKEN_LEN],
            filled: 0,
        }
    }

    /// Feed one byte, returning true when the token completes
    pub fn feed(&mut self, byte: u8) -> bool {
        self.window.copy_within(1.., 0);
        self.window[TOKEN_LEN - 1] = byte;
        self.filled = (self.filled + 1).min(TOKEN_LEN);

        if self.filled == TOKEN_LEN && self.window == *ABORT_TOKEN {
            self.reset();
            true
        } else {
            false
        }
    }

    /// Forget any partial match
    pub fn reset(&mut self) {
        self.window = [0; TOKEN_LEN];
        self.filled = 0;
    }
}

/// Emergency stop latch
///
/// Set by `EMERGENCY_STOP` or by the abort token; cleared only by an
/// explicit reset or homing command.
#[derive(Debug, Clone, Default)]
pub struct EmergencyStop {
    active: bool,
    scanner: AbortScanner,
    /// Rest of the line carrying the token has not been seen yet
    discarding: bool,
}

impl EmergencyStop {
    /// Create a released latch
    pub fn new() -> Self {
        Self {
            active: false,
            scanner: AbortScanner::new(),
            discarding: false,
        }
    }

    /// Latch the emergency stop
    pub fn trip(&mut self) {
        self.active = true;
    }

    /// Release the latch
    pub fn clear(&mut self) {
        self.active = false;
        self.scanner.reset();
    }

    /// Check if the emergency stop is latched
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Drain pending console input looking for the abort token
    ///
    /// Returns true if this scan latched the stop. Scanned bytes are
    /// discarded. Once the token matches, the remainder of its line is
    /// consumed through the terminator so `EMERGENCY_STOP` is not seen
    /// again as a command.
    pub fn scan<C: Console>(&mut self, console: &mut C) -> bool {
        let mut newly = false;
        for _ in 0..MAX_SCAN_BYTES {
            let Some(byte) = console.read_byte() else {
                break;
            };
            if self.discarding {
                self.discard(byte);
                if self.discarding {
                    continue;
                }
                break;
            }
            if self.scanner.feed(byte) {
                newly |= !self.active;
                self.active = true;
                self.discarding = true;
            }
        }
        newly
    }

    /// Swallow a byte belonging to the line that carried the abort token
    ///
    /// Returns true if the byte was consumed. The terminator ends the
    /// discard and is consumed too.
    pub fn discard(&mut self, byte: u8) -> bool {
        if !self.discarding {
            return false;
        }
        if matches!(byte, b'\r' | b'\n') {
            self.discarding = false;
        }
        true
    }

    /// Check if the tail of an abort line is still being swallowed
    pub fn is_discarding(&self) -> bool {
        self.discarding
    }
}
