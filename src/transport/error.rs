//! Common error types for transport operations

/// A common error type for byte-transport operations.
///
/// This enum defines a set of common errors that can occur when working with
/// serial-style transports. It is designed to be simple and portable for
/// `no_std` environments.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// An error occurred during a read operation.
    ReadError,
    /// An error occurred during a write operation.
    WriteError,
    /// The transport is no longer connected.
    Disconnected,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::ReadError => defmt::write!(f, "ReadError"),
            Error::WriteError => defmt::write!(f, "WriteError"),
            Error::Disconnected => defmt::write!(f, "Disconnected"),
        }
    }
}
