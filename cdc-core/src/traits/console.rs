//! Serial console trait

/// Byte-level access to the command console
///
/// Reads never block. Writes are best effort: a console has nowhere to
/// report its own failures.
pub trait Console {
    /// Take one received byte, if any is pending
    fn read_byte(&mut self) -> Option<u8>;

    /// Queue bytes for transmission
    fn write_bytes(&mut self, bytes: &[u8]);

    /// Write a string
    fn write_str(&mut self, text: &str) {
        self.write_bytes(text.as_bytes());
    }
}
