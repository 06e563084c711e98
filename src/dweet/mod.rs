//! The Dweet name/value command protocol.
//!
//! Dweet is a line-oriented GET/SET protocol for device configuration and
//! control, carried inside checksummed sentences (see [`crate::sentence`]).
//! Each sentence field is one command item:
//!
//! ```text
//! GETSTATE=BLINKINTERVAL             query a runtime property
//! SETSTATE=BLINKINTERVAL:00007530    set a runtime property
//! GETCONFIG=BLINKINTERVAL            query the persisted value
//! SETCONFIG=BLINKINTERVAL:00007530   persist a value for the next boot
//! ```
//!
//! Property names are short fixed ASCII tokens resolved case-sensitively by
//! a linear scan over a [`Setting`] table; values are fixed-width hex ASCII
//! (8 chars for a 32-bit property). Replies echo
//! `<OP>_REPLY=<NAME>[:<VALUE>]` on success and `<OP>_ERROR=<NAME>:<TOKEN>`
//! on failure.
//!
//! # Settings tables
//!
//! A module exposes its properties as a table of name/handler pairs, usable
//! in `const` context:
//!
//! ```rust
//! use libdweet::dweet::{self, DweetError, Setting, SettingValue};
//!
//! struct App {
//!     blink_interval_ms: u32,
//! }
//!
//! fn blink_interval(app: &mut App, value: &mut SettingValue, is_set: bool) -> Result<(), DweetError> {
//!     if is_set {
//!         app.blink_interval_ms = dweet::parse_hex_u32(value)?;
//!         Ok(())
//!     } else {
//!         value.clear();
//!         dweet::write_hex_u32(app.blink_interval_ms, value)
//!     }
//! }
//!
//! const TABLE: &[Setting<App>] = &[Setting {
//!     name: "BLINKINTERVAL",
//!     offset: 0,
//!     size: 8,
//!     handler: blink_interval,
//! }];
//!
//! let mut app = App { blink_interval_ms: 1000 };
//! let set = dweet::process_item(&mut app, TABLE, "BLINKINTERVAL", Some("00007530"));
//! assert!(matches!(set, Some(Ok(_))));
//! assert_eq!(app.blink_interval_ms, 0x7530);
//!
//! let get = dweet::process_item(&mut app, TABLE, "BLINKINTERVAL", None);
//! assert_eq!(get.unwrap().unwrap().as_str(), "00007530");
//! ```

/// Persisted settings: checksummed storage walk and boot-time bulk load
pub mod config;

/// Maximum length of one property value in hex-ASCII characters.
pub const MAX_VALUE_LENGTH: usize = 32;

/// Working buffer for property values, shared between GET and SET handler
/// invocations.
pub type SettingValue = heapless::String<MAX_VALUE_LENGTH>;

/// Command-level error codes, reported to the remote caller in the reply
/// sentence. Never fatal to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DweetError {
    /// Malformed hex, wrong width, or out-of-range value.
    InvalidParameter,
    /// The reply buffer cannot hold the property's canonical encoding.
    ParameterTooShort,
    /// The persisted settings block is corrupt or was never initialized.
    InvalidChecksum,
    /// The operation is not supported (unknown property, or a write to a
    /// read-only one).
    Unsupported,
    /// The backing storage device failed.
    StorageFault,
}

impl DweetError {
    /// The wire token carried in `<OP>_ERROR=<NAME>:<TOKEN>` replies.
    pub fn token(self) -> &'static str {
        match self {
            DweetError::InvalidParameter => "INVALID_PARAMETER",
            DweetError::ParameterTooShort => "PARAMETER_TOO_SHORT",
            DweetError::InvalidChecksum => "INVALID_CHECKSUM",
            DweetError::Unsupported => "UNSUP",
            DweetError::StorageFault => "STORAGE_FAULT",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DweetError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            DweetError::InvalidParameter => defmt::write!(f, "InvalidParameter"),
            DweetError::ParameterTooShort => defmt::write!(f, "ParameterTooShort"),
            DweetError::InvalidChecksum => defmt::write!(f, "InvalidChecksum"),
            DweetError::Unsupported => defmt::write!(f, "Unsupported"),
            DweetError::StorageFault => defmt::write!(f, "StorageFault"),
        }
    }
}

/// The four built-in command operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DweetOp {
    /// `GETSTATE`: query a runtime property.
    GetState,
    /// `SETSTATE`: set a runtime property.
    SetState,
    /// `GETCONFIG`: query a persisted property.
    GetConfig,
    /// `SETCONFIG`: persist a property value.
    SetConfig,
}

impl DweetOp {
    /// Parse an operation token. Unknown tokens route to the channel's
    /// unhandled-command hook instead.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "GETSTATE" => Some(DweetOp::GetState),
            "SETSTATE" => Some(DweetOp::SetState),
            "GETCONFIG" => Some(DweetOp::GetConfig),
            "SETCONFIG" => Some(DweetOp::SetConfig),
            _ => None,
        }
    }

    /// The wire token for this operation.
    pub fn token(self) -> &'static str {
        match self {
            DweetOp::GetState => "GETSTATE",
            DweetOp::SetState => "SETSTATE",
            DweetOp::GetConfig => "GETCONFIG",
            DweetOp::SetConfig => "SETCONFIG",
        }
    }
}

/// One parsed command item: `OP=NAME[:VALUE]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DweetCommand<'a> {
    /// Operation token as received (may be an application-defined verb).
    pub op: &'a str,
    /// Property name.
    pub name: &'a str,
    /// Value, present on SET items.
    pub value: Option<&'a str>,
}

/// Parse one sentence field into a [`DweetCommand`]. Returns `None` for
/// items that don't match the `OP=NAME[:VALUE]` shape.
pub fn parse_command(item: &str) -> Option<DweetCommand<'_>> {
    let (op, rest) = item.split_once('=')?;
    if op.is_empty() || rest.is_empty() {
        return None;
    }
    let (name, value) = match rest.split_once(':') {
        Some((name, value)) => (name, Some(value)),
        None => (rest, None),
    };
    if name.is_empty() {
        return None;
    }
    Some(DweetCommand { op, name, value })
}

/// A property handler: receives the application context, the shared value
/// buffer, and the operation direction.
///
/// On SET (`is_set == true`) the buffer holds the raw hex text from the
/// wire; the handler decodes, validates, and applies it. On GET the handler
/// clears the buffer and writes the property's canonical fixed-width hex
/// encoding into it.
pub type SettingFn<A> = fn(&mut A, &mut SettingValue, bool) -> Result<(), DweetError>;

/// One settings-table entry binding a property name to its handler and its
/// persisted-storage field.
///
/// `offset` and `size` describe the property's backing field for the
/// configuration layer ([`config`]): `size` hex-ASCII characters at absolute
/// storage offset `offset`. Tables without persisted backing can leave both
/// zero.
pub struct Setting<A> {
    /// Property name, a short fixed ASCII token (e.g. `"BLINKINTERVAL"`),
    /// matched case-sensitively.
    pub name: &'static str,
    /// Absolute byte offset of the backing field in persistent storage.
    pub offset: u32,
    /// Width of the backing field in hex-ASCII characters (8 for a u32).
    pub size: usize,
    /// The GET/SET handler for this property.
    pub handler: SettingFn<A>,
}

impl<A> core::fmt::Debug for Setting<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Setting")
            .field("name", &self.name)
            .field("offset", &self.offset)
            .field("size", &self.size)
            .finish()
    }
}

/// Find a table entry by exact name.
pub fn find<'t, A>(table: &'t [Setting<A>], name: &str) -> Option<&'t Setting<A>> {
    table.iter().find(|setting| setting.name == name)
}

/// Process one GET (`value == None`) or SET item against a runtime settings
/// table.
///
/// Returns `None` when `name` is not in the table (the caller falls through
/// to its unhandled-command hook), otherwise the handler's outcome: the
/// canonical value text for GET, an empty value for SET.
pub fn process_item<A>(
    app: &mut A,
    table: &[Setting<A>],
    name: &str,
    value: Option<&str>,
) -> Option<Result<SettingValue, DweetError>> {
    let setting = find(table, name)?;
    let mut buffer = SettingValue::new();
    let outcome = match value {
        Some(text) => {
            if buffer.push_str(text).is_err() {
                return Some(Err(DweetError::InvalidParameter));
            }
            (setting.handler)(app, &mut buffer, true).map(|_| SettingValue::new())
        }
        None => (setting.handler)(app, &mut buffer, false).map(|_| buffer),
    };
    Some(outcome)
}

fn write_hex(value: u32, digits: usize, out: &mut SettingValue) -> Result<(), DweetError> {
    const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    for i in (0..digits).rev() {
        let nibble = (value >> (i * 4)) & 0xF;
        out.push(HEX_DIGITS[nibble as usize] as char)
            .map_err(|_| DweetError::ParameterTooShort)?;
    }
    Ok(())
}

fn parse_hex(text: &str, digits: usize) -> Result<u32, DweetError> {
    if text.len() != digits || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DweetError::InvalidParameter);
    }
    u32::from_str_radix(text, 16).map_err(|_| DweetError::InvalidParameter)
}

/// Decode exactly 8 hex chars into a u32. Upper- or lowercase digits are
/// accepted; anything else is [`DweetError::InvalidParameter`].
pub fn parse_hex_u32(text: &str) -> Result<u32, DweetError> {
    parse_hex(text, 8)
}

/// Decode exactly 4 hex chars into a u16.
pub fn parse_hex_u16(text: &str) -> Result<u16, DweetError> {
    parse_hex(text, 4).map(|v| v as u16)
}

/// Decode exactly 2 hex chars into a u8.
pub fn parse_hex_u8(text: &str) -> Result<u8, DweetError> {
    parse_hex(text, 2).map(|v| v as u8)
}

/// Append the canonical 8-char uppercase encoding of a u32.
pub fn write_hex_u32(value: u32, out: &mut SettingValue) -> Result<(), DweetError> {
    write_hex(value, 8, out)
}

/// Append the canonical 4-char uppercase encoding of a u16.
pub fn write_hex_u16(value: u16, out: &mut SettingValue) -> Result<(), DweetError> {
    write_hex(value as u32, 4, out)
}

/// Append the canonical 2-char uppercase encoding of a u8.
pub fn write_hex_u8(value: u8, out: &mut SettingValue) -> Result<(), DweetError> {
    write_hex(value as u32, 2, out)
}
