//! Serial console adapter
//!
//! Bridges any blocking `embedded-io` byte stream to the controller's
//! non-blocking [`Console`] trait.

use cdc_core::traits::Console;
use embedded_io::{Read, ReadReady, Write};

/// Console over a UART or similar stream
pub struct IoConsole<T> {
    io: T,
}

impl<T> IoConsole<T> {
    pub fn new(io: T) -> Self {
        Self { io }
    }

    pub fn into_inner(self) -> T {
        self.io
    }
}

impl<T: Read + ReadReady + Write> Console for IoConsole<T> {
    fn read_byte(&mut self) -> Option<u8> {
        // Never block: only read what has already arrived
        if !self.io.read_ready().unwrap_or(false) {
            return None;
        }
        let mut byte = [0u8];
        match self.io.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        // Output is best effort; a stalled host must not stop the machine
        let _ = self.io.write_all(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_io::ErrorType;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Loopback {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
    }

    impl ErrorType for Loopback {
        type Error = Infallible;
    }

    impl Read for Loopback {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
            let mut n = 0;
            while n < buf.len() {
                match self.rx.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }
    }

    impl ReadReady for Loopback {
        fn read_ready(&mut self) -> Result<bool, Infallible> {
            Ok(!self.rx.is_empty())
        }
    }

    impl Write for Loopback {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
            self.tx.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    #[test]
    fn test_reads_pending_bytes_then_none() {
        let mut io = Loopback::default();
        io.rx.extend(b"OK");
        let mut console = IoConsole::new(io);
        assert_eq!(console.read_byte(), Some(b'O'));
        assert_eq!(console.read_byte(), Some(b'K'));
        assert_eq!(console.read_byte(), None);
    }

    #[test]
    fn test_write_line() {
        let mut console = IoConsole::new(Loopback::default());
        console.write_str("STATUS:READY,0.0,0.0\r\n");
        assert_eq!(console.into_inner().tx, b"STATUS:READY,0.0,0.0\r\n");
    }
}
