//! Record Module
//!
//! The fixed-schema record persisted by every layout, its field limits,
//! and the collaborators that produce and normalize records.
//!
//! ## Field Constraints
//! ```text
//! ┌─────────────────┬──────────────────────────────────────────┐
//! │ key             │ 1 ..= 999_999_999 (0 marks an empty slot) │
//! │ name            │ 1 ..= 50 bytes UTF-8                      │
//! │ national_id     │ exactly 11 ASCII digits                   │
//! │ program         │ 1 ..= 30 bytes UTF-8                      │
//! │ guardian_a / _b │ 1 ..= 30 bytes UTF-8                      │
//! │ enrollment_year │ 1000 ..= 9999                             │
//! │ score           │ 0.00 ..= 10.00, two decimals              │
//! └─────────────────┴──────────────────────────────────────────┘
//! ```

mod generator;
mod validator;

pub use generator::{RecordGenerator, DEFAULT_FIRST_KEY};
pub use validator::{FieldValidator, RecordValidator};

// =============================================================================
// Field Constants
// =============================================================================

/// Largest key that fits the 9-digit limit
pub const MAX_KEY: u32 = 999_999_999;

/// Maximum number of decimal digits in a key
pub const MAX_KEY_DIGITS: usize = 9;

/// Key value reserved for empty slots and zero padding
pub const EMPTY_KEY: u32 = 0;

/// Exact length of the national ID
pub const NATIONAL_ID_LEN: usize = 11;

pub const MIN_ENROLLMENT_YEAR: u32 = 1000;
pub const MAX_ENROLLMENT_YEAR: u32 = 9999;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// Byte used to pad short text in fixed-width records
pub const PAD_BYTE: u8 = b'#';

/// Width of the key and enrollment year on disk
pub(crate) const U32_WIDTH: usize = 4;

/// Width of the scaled score on disk
pub(crate) const SCORE_WIDTH: usize = 8;

/// Width of a text length prefix in variable-width records
pub(crate) const LEN_PREFIX_WIDTH: usize = 4;

// =============================================================================
// Record
// =============================================================================

/// One student-style record
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub key: u32,
    pub name: String,
    pub national_id: String,
    pub program: String,
    pub guardian_a: String,
    pub guardian_b: String,
    pub enrollment_year: u32,
    pub score: f64,
}

// =============================================================================
// Field Limits
// =============================================================================

/// Maximum byte widths of the text fields
///
/// The fixed-width layout derives its record size from these limits, so a
/// file must be reopened with the same limits it was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLimits {
    pub name: usize,
    pub program: usize,
    pub guardian: usize,
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self {
            name: 50,
            program: 30,
            guardian: 30,
        }
    }
}

impl FieldLimits {
    /// Size of one fixed-width record: every text field at its maximum width
    pub fn fixed_record_size(&self) -> usize {
        U32_WIDTH
            + self.name
            + NATIONAL_ID_LEN
            + self.program
            + 2 * self.guardian
            + U32_WIDTH
            + SCORE_WIDTH
    }

    /// Smallest valid variable-width encoding (every text field one byte)
    pub fn min_variable_size(&self) -> usize {
        Self::variable_size(1, 1, 1, 1)
    }

    /// Variable-width size for the given text lengths
    pub(crate) fn variable_size(
        name: usize,
        program: usize,
        guardian_a: usize,
        guardian_b: usize,
    ) -> usize {
        U32_WIDTH
            + LEN_PREFIX_WIDTH
            + name
            + NATIONAL_ID_LEN
            + LEN_PREFIX_WIDTH
            + program
            + LEN_PREFIX_WIDTH
            + guardian_a
            + LEN_PREFIX_WIDTH
            + guardian_b
            + U32_WIDTH
            + SCORE_WIDTH
    }
}

impl Record {
    /// Score scaled to an integer number of hundredths
    pub fn scaled_score(&self) -> u64 {
        (self.score * 100.0).round() as u64
    }

    /// Serialized size of this record in the variable-width encoding
    pub fn variable_size(&self) -> usize {
        FieldLimits::variable_size(
            self.name.len(),
            self.program.len(),
            self.guardian_a.len(),
            self.guardian_b.len(),
        )
    }
}
