//! Checksummed sentence framing, modeled on NMEA 0183.
//!
//! A sentence on the wire looks like:
//!
//! ```text
//! $PDWT,SETSTATE=BLINKINTERVAL:00007530*75\n
//! ```
//!
//! `$` starts a sentence, `,` separates fields, `*HH` carries a two-hex-digit
//! XOR checksum over the bytes between `$` and `*`, and `\n` terminates the
//! line (`\r` is ignored). This module provides the byte-at-a-time
//! [`SentenceAssembler`], the checksum primitives, receive-side
//! [`validate`], and transmit-side [`encode`].
//!
//! # Resynchronization
//!
//! The assembler recovers from corruption locally and silently:
//!
//! - A terminator with no preceding content is a bare *sync*: the buffer
//!   resets and nothing is delivered. Peers send one to re-establish a
//!   message boundary without issuing a real command.
//! - Filling the buffer without seeing a terminator discards everything
//!   accumulated ([`Push::Overflow`]); one garbled message is dropped rather
//!   than partially repaired, and the next terminator restores framing.
//!
//! The assembler never delivers a line longer than its fixed capacity and
//! never delivers bytes that straddle a resync boundary.

/// Maximum length of one assembled line, terminator excluded (NMEA-sized).
pub const MAX_SENTENCE_LENGTH: usize = 80;

/// Sentence start delimiter.
pub const START_DELIMITER: u8 = b'$';
/// Field separator.
pub const FIELD_DELIMITER: u8 = b',';
/// Checksum marker.
pub const CHECKSUM_DELIMITER: u8 = b'*';
/// Line terminator.
pub const TERMINATOR: u8 = b'\n';

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Outcome of feeding one byte to the [`SentenceAssembler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Push {
    /// Byte accumulated; no complete line yet.
    Pending,
    /// Bare terminator with no content: sync signal, buffer reset.
    Synced,
    /// A complete line is available via [`SentenceAssembler::line`]; the
    /// caller must [`reset`](SentenceAssembler::reset) before feeding more
    /// bytes.
    Complete,
    /// Buffer filled without a terminator; accumulated bytes were discarded
    /// and the assembler is back to idle.
    Overflow,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Push {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Push::Pending => defmt::write!(f, "Pending"),
            Push::Synced => defmt::write!(f, "Synced"),
            Push::Complete => defmt::write!(f, "Complete"),
            Push::Overflow => defmt::write!(f, "Overflow"),
        }
    }
}

/// Sentence validation and encoding errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceError {
    /// The line is empty.
    Empty,
    /// The line does not start with `$`.
    InvalidStart,
    /// The trailing `*HH` checksum is malformed or does not match.
    InvalidChecksum,
    /// The encoded sentence does not fit the output buffer.
    TooLong,
}

#[cfg(feature = "defmt")]
impl defmt::Format for SentenceError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            SentenceError::Empty => defmt::write!(f, "Empty"),
            SentenceError::InvalidStart => defmt::write!(f, "InvalidStart"),
            SentenceError::InvalidChecksum => defmt::write!(f, "InvalidChecksum"),
            SentenceError::TooLong => defmt::write!(f, "TooLong"),
        }
    }
}

/// Accumulates one framed line from a raw byte stream.
///
/// Bytes are consumed one at a time as the transport makes them available;
/// the assembler never waits.
#[derive(Debug)]
pub struct SentenceAssembler {
    buffer: heapless::Vec<u8, MAX_SENTENCE_LENGTH>,
}

impl SentenceAssembler {
    /// Create an idle assembler.
    pub fn new() -> Self {
        Self {
            buffer: heapless::Vec::new(),
        }
    }

    /// Feed one byte from the transport.
    pub fn push(&mut self, byte: u8) -> Push {
        match byte {
            TERMINATOR => {
                if self.buffer.is_empty() {
                    Push::Synced
                } else {
                    Push::Complete
                }
            }
            b'\r' => Push::Pending,
            _ => {
                if self.buffer.push(byte).is_err() {
                    self.buffer.clear();
                    Push::Overflow
                } else {
                    Push::Pending
                }
            }
        }
    }

    /// The assembled line (terminator excluded). Meaningful only after
    /// [`push`](Self::push) returned [`Push::Complete`]. Non-UTF-8 garbage
    /// yields an empty line, which [`validate`] then rejects.
    pub fn line(&self) -> &str {
        core::str::from_utf8(&self.buffer).unwrap_or("")
    }

    /// Discard any accumulated bytes and return to idle.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Number of bytes currently accumulated.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True when no bytes are accumulated.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for SentenceAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Calculate the XOR checksum of a line: every byte after a leading `$`, up
/// to but excluding `*` (or the end of the line).
pub fn checksum(line: &str) -> u8 {
    let bytes = line.as_bytes();
    let start = usize::from(bytes.first() == Some(&START_DELIMITER));
    let mut sum = 0u8;
    for &byte in &bytes[start..] {
        if byte == CHECKSUM_DELIMITER {
            break;
        }
        sum ^= byte;
    }
    sum
}

/// True when the line carries a trailing `*HH` checksum field.
pub fn has_checksum(line: &str) -> bool {
    let bytes = line.as_bytes();
    bytes.len() >= 3 && bytes[bytes.len() - 3] == CHECKSUM_DELIMITER
}

/// Validate a complete line and strip the framing, returning the body
/// between `$` and `*` (or end of line).
///
/// A line without a checksum field is accepted (common NMEA practice for
/// hand-typed sentences), but a present checksum must parse and match.
pub fn validate(line: &str) -> Result<&str, SentenceError> {
    if line.is_empty() {
        return Err(SentenceError::Empty);
    }
    let bytes = line.as_bytes();
    if bytes[0] != START_DELIMITER {
        return Err(SentenceError::InvalidStart);
    }

    if has_checksum(line) {
        let expected = checksum(line);
        let digits = &line[line.len() - 2..];
        match u8::from_str_radix(digits, 16) {
            Ok(actual) if actual == expected => Ok(&line[1..line.len() - 3]),
            _ => Err(SentenceError::InvalidChecksum),
        }
    } else {
        Ok(&line[1..])
    }
}

/// Frame `body` as a complete sentence into `out`:
/// `$` + body + `*HH` + `\n`, with an uppercase checksum over `body`.
pub fn encode<const N: usize>(body: &str, out: &mut heapless::String<N>) -> Result<(), SentenceError> {
    out.clear();
    let sum = {
        let mut sum = 0u8;
        for &byte in body.as_bytes() {
            sum ^= byte;
        }
        sum
    };
    let framed = out
        .push(START_DELIMITER as char)
        .and_then(|_| out.push_str(body))
        .and_then(|_| out.push(CHECKSUM_DELIMITER as char))
        .and_then(|_| out.push(HEX_DIGITS[(sum >> 4) as usize] as char))
        .and_then(|_| out.push(HEX_DIGITS[(sum & 0x0F) as usize] as char))
        .and_then(|_| out.push(TERMINATOR as char));
    framed.map_err(|_| SentenceError::TooLong)
}
