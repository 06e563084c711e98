//! Byte-transport abstraction for serial and radio-emulated-serial links.
//!
//! The sentence framer is transport-agnostic: anything that can hand over
//! pending bytes without blocking and accept bytes for transmission can back
//! a Dweet channel. A UART, a radio link presenting a serial surface, or an
//! in-memory loopback in tests all implement the same two traits.

/// Common error types for transport operations
pub mod error;

/// Trait for reading pending bytes from a transport.
pub trait Read {
    /// Associated error type.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` pending bytes. Never blocks: returns `Ok(0)`
    /// when nothing is available.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Trait for writing bytes to a transport.
pub trait Write {
    /// Associated error type.
    type Error: core::fmt::Debug;

    /// Write bytes, returning how many were accepted.
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// A bidirectional byte transport.
pub trait Transport: Read + Write {}
