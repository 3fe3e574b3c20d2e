//! Record Codec Module
//!
//! Encodes and decodes one record to and from bytes.
//!
//! ## Fixed-width Format (default limits: 167 bytes)
//! ```text
//! ┌─────────┬───────────┬──────────┬───────────┬──────────┬──────────┬──────────┬───────────┐
//! │ Key (4) │ Name (50) │ NatID(11)│ Prog (30) │ GuardA   │ GuardB   │ Year (4) │ Score (8) │
//! │  u32 LE │ '#'-padded│  digits  │ '#'-padded│ (30)     │ (30)     │  u32 LE  │ x100 u64  │
//! └─────────┴───────────┴──────────┴───────────┴──────────┴──────────┴──────────┴───────────┘
//! ```
//!
//! ## Variable-width Format
//! ```text
//! ┌─────────┬─────────┬──────┬──────────┬─────────┬──────┬─────┬──────────┬───────────┐
//! │ Key (4) │ Len (4) │ Name │ NatID(11)│ Len (4) │ Prog │ ... │ Year (4) │ Score (8) │
//! └─────────┴─────────┴──────┴──────────┴─────────┴──────┴─────┴──────────┴───────────┘
//! ```
//!
//! All integers are little-endian. Both codecs normalize and validate before
//! encoding, and validate again after decoding.

mod fixed;
mod variable;

use bytes::{Buf, Bytes};

use crate::error::{BlockError, Result};
use crate::record::{Record, RecordValidator};

pub use fixed::FixedCodec;
pub use variable::VariableCodec;

/// Encoding family shared by the layouts
pub trait RecordCodec: Send + Sync {
    /// Normalize, validate and serialize one record
    fn encode(&self, record: &Record) -> Result<Bytes>;

    /// Deserialize the record at the start of `bytes` and validate it.
    /// Trailing bytes after the record are ignored.
    fn decode(&self, bytes: &[u8]) -> Result<Record>;
}

/// Read the leading key of an encoded record without decoding the rest
pub fn peek_key(bytes: &[u8]) -> Option<u32> {
    let raw: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
    Some(u32::from_le_bytes(raw))
}

/// Apply the validator's normalization and reject what is still invalid
pub(crate) fn normalized(validator: &dyn RecordValidator, record: &Record) -> Result<Record> {
    let mut record = record.clone();
    validator.truncate_to_limits(&mut record);
    validator.validate(&record)?;
    Ok(record)
}

/// Re-run validation on a freshly decoded record
pub(crate) fn validated(validator: &dyn RecordValidator, record: Record) -> Result<Record> {
    match validator.validate(&record) {
        Ok(()) => Ok(record),
        Err(e) => Err(BlockError::Decode(format!(
            "decoded record {} fails validation: {}",
            record.key, e
        ))),
    }
}

// =============================================================================
// Bounds-checked field reader
// =============================================================================

/// Cursor over an encoded record that turns every overrun into a
/// `Decode` error instead of a panic
pub(crate) struct FieldReader<'a> {
    buf: &'a [u8],
    start_len: usize,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            start_len: buf.len(),
        }
    }

    /// Bytes consumed so far
    pub(crate) fn consumed(&self) -> usize {
        self.start_len - self.buf.len()
    }

    fn ensure(&self, needed: usize, field: &str) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(BlockError::Decode(format!(
                "{} needs {} bytes but only {} remain",
                field,
                needed,
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    pub(crate) fn u32(&mut self, field: &str) -> Result<u32> {
        self.ensure(4, field)?;
        Ok(self.buf.get_u32_le())
    }

    pub(crate) fn u64(&mut self, field: &str) -> Result<u64> {
        self.ensure(8, field)?;
        Ok(self.buf.get_u64_le())
    }

    pub(crate) fn bytes(&mut self, len: usize, field: &str) -> Result<&'a [u8]> {
        self.ensure(len, field)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    pub(crate) fn text(&mut self, len: usize, field: &str) -> Result<String> {
        let raw = self.bytes(len, field)?;
        utf8(raw, field)
    }

    /// Length-prefixed text; returns the raw bytes without UTF-8 checks
    pub(crate) fn prefixed(&mut self, field: &str) -> Result<&'a [u8]> {
        let len = self.u32(field)? as usize;
        self.bytes(len, field)
    }
}

pub(crate) fn utf8(raw: &[u8], field: &str) -> Result<String> {
    String::from_utf8(raw.to_vec())
        .map_err(|e| BlockError::Decode(format!("{} is not valid UTF-8: {}", field, e)))
}
