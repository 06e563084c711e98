//! Persistent-storage abstraction consumed by the configuration layer.
//!
//! The configuration table walk (see [`crate::dweet::config`]) only needs a
//! byte-addressed read/write contract; these traits express exactly that.
//! Real devices (EEPROM, FRAM, a flash page) implement them in platform
//! code; [`RamStorage`] provides an array-backed device for tests and
//! host-side demos, and [`NoStore`] is the null device for builds without
//! persisted settings.

/// Common error types for storage operations
pub mod error;

pub use error::Error;

/// Trait for reading data from storage devices.
pub trait ReadStorage {
    /// Associated error type for read operations.
    type Error: core::fmt::Debug;

    /// Read `bytes.len()` bytes starting at `offset`. The entire buffer is
    /// filled unless an error occurs.
    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error>;

    /// Total capacity of the device in bytes.
    fn capacity(&self) -> usize;
}

/// Trait for storage devices that support both read and write operations.
pub trait Storage: ReadStorage {
    /// Write `bytes` starting at `offset`.
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// RAM-backed storage device, byte-addressable and bounds-checked.
///
/// Fresh devices read as `0xFF` (erased-flash convention), so a
/// never-provisioned settings region fails its checksum instead of parsing
/// as zeros.
#[derive(Debug, Clone)]
pub struct RamStorage<const N: usize> {
    data: [u8; N],
}

impl<const N: usize> RamStorage<N> {
    /// Create an erased (all `0xFF`) device.
    pub fn new() -> Self {
        Self { data: [0xFF; N] }
    }

    /// Read-only view of the backing memory.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Mutable view of the backing memory (tests use this to inject
    /// corruption).
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl<const N: usize> Default for RamStorage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ReadStorage for RamStorage<N> {
    type Error = Error;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        let end = start.checked_add(bytes.len()).ok_or(Error::OutOfBounds)?;
        if end > N {
            return Err(Error::OutOfBounds);
        }
        bytes.copy_from_slice(&self.data[start..end]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Storage for RamStorage<N> {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        let end = start.checked_add(bytes.len()).ok_or(Error::OutOfBounds)?;
        if end > N {
            return Err(Error::OutOfBounds);
        }
        self.data[start..end].copy_from_slice(bytes);
        Ok(())
    }
}

/// Null storage device for builds without persisted settings. Every
/// operation fails with [`Error::NotInitialized`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStore;

impl ReadStorage for NoStore {
    type Error = Error;

    fn read(&mut self, _offset: u32, _bytes: &mut [u8]) -> Result<(), Self::Error> {
        Err(Error::NotInitialized)
    }

    fn capacity(&self) -> usize {
        0
    }
}

impl Storage for NoStore {
    fn write(&mut self, _offset: u32, _bytes: &[u8]) -> Result<(), Self::Error> {
        Err(Error::NotInitialized)
    }
}
