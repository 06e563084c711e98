//! Persisted settings: the checksummed storage walk behind
//! `GETCONFIG`/`SETCONFIG` and the boot-time bulk load.
//!
//! # Layout
//!
//! Persisted values live in one contiguous [`SettingsRegion`] of the storage
//! device, laid out as concatenated fixed-width hex-ASCII fields (one per
//! table entry, at that entry's declared `offset`/`size`), immediately
//! followed by a 2-byte little-endian checksum at `base + len`. The checksum
//! is the CRC-32 of the declared range truncated to 16 bits; load and store
//! use the same function, which is all the contract requires.
//!
//! # Failure policy
//!
//! Runtime SETs validate the incoming text completely before touching
//! storage, so a rejected value leaves both storage and the checksum
//! untouched. The boot-time [`load_settings`] walk reports a single
//! aggregate [`LoadOutcome`]; a checksum failure applies nothing, and the
//! device is expected to continue on in-memory defaults rather than block
//! boot.

use crate::dweet::{DweetError, Setting, SettingValue, find};
use crate::storage::{ReadStorage, Storage};

/// Size of the stored checksum in bytes.
pub const CHECKSUM_SIZE: u32 = 2;

/// The contiguous storage range covered by a settings table's checksum.
/// The checksum itself is stored at `base + len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsRegion {
    /// First byte of the checksummed range.
    pub base: u32,
    /// Length of the checksummed range in bytes.
    pub len: u32,
}

impl SettingsRegion {
    /// Storage offset of the 2-byte checksum.
    pub fn checksum_offset(&self) -> u32 {
        self.base + self.len
    }
}

/// Aggregate result of a [`load_settings`] walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Every entry validated and applied.
    Loaded,
    /// The stored checksum did not match; nothing was applied.
    InvalidChecksum,
    /// A handler rejected its stored value; the error is from the first
    /// entry that failed. Entries applied before it keep their new state.
    InvalidValue(DweetError),
}

#[cfg(feature = "defmt")]
impl defmt::Format for LoadOutcome {
    fn format(&self, f: defmt::Formatter) {
        match self {
            LoadOutcome::Loaded => defmt::write!(f, "Loaded"),
            LoadOutcome::InvalidChecksum => defmt::write!(f, "InvalidChecksum"),
            LoadOutcome::InvalidValue(e) => defmt::write!(f, "InvalidValue({})", e),
        }
    }
}

/// Compute the checksum of a region's current contents.
pub fn region_checksum<S: ReadStorage>(
    storage: &mut S,
    region: &SettingsRegion,
) -> Result<u16, S::Error> {
    let mut hasher = crc32fast::Hasher::new();
    let mut chunk = [0u8; 32];
    let mut offset = region.base;
    let end = region.base + region.len;
    while offset < end {
        let n = ((end - offset) as usize).min(chunk.len());
        storage.read(offset, &mut chunk[..n])?;
        hasher.update(&chunk[..n]);
        offset += n as u32;
    }
    Ok((hasher.finalize() & 0xFFFF) as u16)
}

/// Read the stored checksum trailing a region.
pub fn read_stored_checksum<S: ReadStorage>(
    storage: &mut S,
    region: &SettingsRegion,
) -> Result<u16, S::Error> {
    let mut bytes = [0u8; CHECKSUM_SIZE as usize];
    storage.read(region.checksum_offset(), &mut bytes)?;
    Ok(u16::from_le_bytes(bytes))
}

/// Recompute a region's checksum and store it. Returns the written value.
/// Call after provisioning a region with default field values.
pub fn write_region_checksum<S: Storage>(
    storage: &mut S,
    region: &SettingsRegion,
) -> Result<u16, S::Error> {
    let sum = region_checksum(storage, region)?;
    storage.write(region.checksum_offset(), &sum.to_le_bytes())?;
    Ok(sum)
}

fn stored_field<A, S: ReadStorage>(
    storage: &mut S,
    setting: &Setting<A>,
) -> Result<Result<SettingValue, DweetError>, S::Error> {
    let mut raw = [0u8; crate::dweet::MAX_VALUE_LENGTH];
    if setting.size > raw.len() {
        return Ok(Err(DweetError::InvalidParameter));
    }
    storage.read(setting.offset, &mut raw[..setting.size])?;
    let field = &raw[..setting.size];
    if !field.iter().all(|b| b.is_ascii_hexdigit()) {
        // Never-provisioned fields read as erased bytes, not hex text.
        return Ok(Err(DweetError::InvalidParameter));
    }
    let mut value = SettingValue::new();
    // Width checked above, always fits.
    let _ = value.push_str(core::str::from_utf8(field).unwrap_or(""));
    Ok(Ok(value))
}

/// Process one `GETCONFIG` (`value == None`) or `SETCONFIG` item against the
/// persisted table.
///
/// Returns `None` when `name` is not in the table. SET validates the text
/// (exact declared width, hex digits only) before any write, then writes the
/// field and rewrites the region checksum; GET returns the stored text,
/// rejecting non-hex (never-initialized) contents.
pub fn process_item<A, S: Storage>(
    storage: &mut S,
    table: &[Setting<A>],
    region: &SettingsRegion,
    name: &str,
    value: Option<&str>,
) -> Option<Result<SettingValue, DweetError>> {
    let setting = find(table, name)?;
    let outcome = match value {
        Some(text) => {
            if text.len() != setting.size || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
                Err(DweetError::InvalidParameter)
            } else if storage.write(setting.offset, text.as_bytes()).is_err() {
                Err(DweetError::StorageFault)
            } else if write_region_checksum(storage, region).is_err() {
                Err(DweetError::StorageFault)
            } else {
                Ok(SettingValue::new())
            }
        }
        None => match stored_field(storage, setting) {
            Ok(outcome) => outcome,
            Err(_) => Err(DweetError::StorageFault),
        },
    };
    Some(outcome)
}

/// Power-on bulk load: validate the region checksum, then invoke every table
/// entry's handler in SET mode with its stored text.
///
/// Returns one aggregate [`LoadOutcome`]; storage I/O failures propagate as
/// `Err`. There is no rollback: entries applied before a mid-table rejection
/// keep their new state, and the caller decides what to do with the single
/// failure code (typically log it and continue on defaults).
pub fn load_settings<A, S: Storage>(
    app: &mut A,
    storage: &mut S,
    table: &[Setting<A>],
    region: &SettingsRegion,
) -> Result<LoadOutcome, S::Error> {
    let stored = read_stored_checksum(storage, region)?;
    let computed = region_checksum(storage, region)?;
    if stored != computed {
        return Ok(LoadOutcome::InvalidChecksum);
    }

    for setting in table {
        let mut value = match stored_field(storage, setting)? {
            Ok(value) => value,
            Err(error) => return Ok(LoadOutcome::InvalidValue(error)),
        };
        if let Err(error) = (setting.handler)(app, &mut value, true) {
            return Ok(LoadOutcome::InvalidValue(error));
        }
    }
    Ok(LoadOutcome::Loaded)
}
