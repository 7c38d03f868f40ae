// crates/telemetry-ingest-core/src/messages/cdr.rs
// ============================================================================
// Module: Telemetry Ingest CDR Reader
// Description: Bounds-checked reader for ROS 2 CDR payloads.
// Purpose: Decode primitive fields from untrusted serialized messages.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! ROS 2 payloads start with a four-byte encapsulation header: two bytes
//! selecting the representation (`00 00` big-endian CDR, `00 01`
//! little-endian CDR) and two option bytes. Primitives in the body are
//! aligned to their own size, measured from the first byte after the header.
//!
//! Security posture: payloads are untrusted. Every read is bounds-checked and
//! declared lengths are validated against the remaining body before use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Size of the encapsulation header in bytes.
const ENCAPSULATION_LEN: usize = 4;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Payload decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Payload ended before a field could be read.
    #[error("payload truncated: {0}")]
    Truncated(String),
    /// Encapsulation header is missing or unsupported.
    #[error("invalid encapsulation: {0}")]
    InvalidEncapsulation(String),
    /// String field is not valid UTF-8.
    #[error("invalid utf-8: {0}")]
    InvalidUtf8(String),
    /// Declared length exceeds the remaining payload.
    #[error("length overflow: {0}")]
    LengthOverflow(String),
    /// Record type descriptor differs from the registered type.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
}

// ============================================================================
// SECTION: Reader
// ============================================================================

/// Cursor over the body of a CDR payload.
#[derive(Debug, Clone)]
pub struct CdrReader<'a> {
    /// Body bytes following the encapsulation header.
    body: &'a [u8],
    /// Read offset within the body.
    offset: usize,
    /// True for little-endian representation.
    little_endian: bool,
}

impl<'a> CdrReader<'a> {
    /// Parses the encapsulation header and positions the cursor at the body.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidEncapsulation`] when the header is
    /// missing or names an unsupported representation.
    pub fn new(payload: &'a [u8]) -> Result<Self, DecodeError> {
        let Some((header, body)) = payload.split_at_checked(ENCAPSULATION_LEN) else {
            return Err(DecodeError::InvalidEncapsulation(format!(
                "payload has {} bytes, header needs {ENCAPSULATION_LEN}",
                payload.len()
            )));
        };
        let little_endian = match (header[0], header[1]) {
            (0x00, 0x00) => false,
            (0x00, 0x01) => true,
            (high, low) => {
                return Err(DecodeError::InvalidEncapsulation(format!(
                    "unsupported representation {high:02x}{low:02x}"
                )));
            }
        };
        Ok(Self {
            body,
            offset: 0,
            little_endian,
        })
    }

    /// Returns the number of unread body bytes.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.body.len().saturating_sub(self.offset)
    }

    /// Advances the cursor to the next multiple of `size`.
    fn align(&mut self, size: usize) -> Result<(), DecodeError> {
        let padding = (size - self.offset % size) % size;
        self.take(padding, "alignment padding").map(|_| ())
    }

    /// Consumes `len` bytes.
    fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8], DecodeError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.body.len())
            .ok_or_else(|| {
                DecodeError::Truncated(format!(
                    "{field} needs {len} bytes at offset {}, {} remain",
                    self.offset,
                    self.remaining()
                ))
            })?;
        let bytes = &self.body[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    /// Reads an aligned fixed-size field.
    fn read_array<const N: usize>(&mut self, field: &str) -> Result<[u8; N], DecodeError> {
        self.align(N)?;
        let bytes = self.take(N, field)?;
        let mut out = [0_u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Reads an unsigned 32-bit integer.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when the body is exhausted.
    pub fn read_u32(&mut self, field: &str) -> Result<u32, DecodeError> {
        let bytes = self.read_array::<4>(field)?;
        Ok(if self.little_endian { u32::from_le_bytes(bytes) } else { u32::from_be_bytes(bytes) })
    }

    /// Reads a signed 32-bit integer.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when the body is exhausted.
    pub fn read_i32(&mut self, field: &str) -> Result<i32, DecodeError> {
        let bytes = self.read_array::<4>(field)?;
        Ok(if self.little_endian { i32::from_le_bytes(bytes) } else { i32::from_be_bytes(bytes) })
    }

    /// Reads a 64-bit float.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when the body is exhausted.
    pub fn read_f64(&mut self, field: &str) -> Result<f64, DecodeError> {
        let bytes = self.read_array::<8>(field)?;
        Ok(if self.little_endian { f64::from_le_bytes(bytes) } else { f64::from_be_bytes(bytes) })
    }

    /// Reads a length-prefixed string (length includes the trailing null).
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::LengthOverflow`] when the declared length
    /// exceeds the body and [`DecodeError::InvalidUtf8`] for invalid text.
    pub fn read_string(&mut self, field: &str) -> Result<String, DecodeError> {
        let declared = self.read_u32(field)?;
        let len = usize::try_from(declared)
            .map_err(|_| DecodeError::LengthOverflow(format!("{field} length {declared}")))?;
        if len > self.remaining() {
            return Err(DecodeError::LengthOverflow(format!(
                "{field} declares {len} bytes, {} remain",
                self.remaining()
            )));
        }
        let bytes = self.take(len, field)?;
        let text = match bytes.split_last() {
            Some((&0, text)) => text,
            _ => bytes,
        };
        std::str::from_utf8(text)
            .map(str::to_string)
            .map_err(|err| DecodeError::InvalidUtf8(format!("{field}: {err}")))
    }

    /// Reads a sequence length and checks the body can hold that many
    /// elements of at least `min_element_len` bytes each.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::LengthOverflow`] when the declared count cannot
    /// fit in the remaining body.
    pub fn read_sequence_len(&mut self, field: &str, min_element_len: usize) -> Result<usize, DecodeError> {
        let declared = self.read_u32(field)?;
        let count = usize::try_from(declared)
            .map_err(|_| DecodeError::LengthOverflow(format!("{field} count {declared}")))?;
        let needed = count.checked_mul(min_element_len).ok_or_else(|| {
            DecodeError::LengthOverflow(format!("{field} count {count} overflows"))
        })?;
        if needed > self.remaining() {
            return Err(DecodeError::LengthOverflow(format!(
                "{field} declares {count} elements needing {needed} bytes, {} remain",
                self.remaining()
            )));
        }
        Ok(count)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
