//! Command line assembly
//!
//! Bytes arriving from the console are accumulated until a line terminator.
//! The buffer keeps one slot in reserve (a 128-byte buffer holds 127
//! characters); anything past that before the terminator is dropped.

use heapless::Vec;

/// Default command buffer size in bytes
pub const LINE_CAPACITY: usize = 128;

/// Accumulates console bytes into complete command lines
#[derive(Debug, Clone, Default)]
pub struct LineBuffer<const N: usize = LINE_CAPACITY> {
    buffer: Vec<u8, N>,
    /// Bytes discarded since the last completed line
    dropped: usize,
}

impl<const N: usize> LineBuffer<N> {
    /// Create an empty line buffer
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            dropped: 0,
        }
    }

    /// Maximum number of characters a single line can hold
    pub const fn usable_len() -> usize {
        N.saturating_sub(1)
    }

    /// Feed one byte from the console
    ///
    /// Returns the completed line when `byte` is `\r` or `\n` and at least
    /// one character was buffered. Empty lines (such as the `\n` of a
    /// `\r\n` pair) produce nothing.
    pub fn feed(&mut self, byte: u8) -> Option<Vec<u8, N>> {
        match byte {
            b'\r' | b'\n' => {
                self.dropped = 0;
                if self.buffer.is_empty() {
                    None
                } else {
                    Some(core::mem::take(&mut self.buffer))
                }
            }
            _ => {
                if self.buffer.len() < Self::usable_len() {
                    // Cannot fail, length checked above
                    let _ = self.buffer.push(byte);
                } else {
                    self.dropped = self.dropped.saturating_add(1);
                }
                None
            }
        }
    }

    /// Discard any partially received line
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.dropped = 0;
    }

    /// Number of characters currently buffered
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if no characters are buffered
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of bytes dropped from the line in progress
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}
