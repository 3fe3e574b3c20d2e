//! Record validation and normalization
//!
//! The validator is built once at startup and injected into the codecs,
//! which call it before every encode and after every decode.

use std::fmt;

use crate::error::{BlockError, Result};

use super::{
    FieldLimits, Record, MAX_ENROLLMENT_YEAR, MAX_KEY, MAX_KEY_DIGITS, MAX_SCORE,
    MIN_ENROLLMENT_YEAR, MIN_SCORE, NATIONAL_ID_LEN,
};

/// Field validation and normalization used by the codecs
pub trait RecordValidator: fmt::Debug + Send + Sync {
    /// Text width limits; the fixed-width layout is derived from them
    fn limits(&self) -> &FieldLimits;

    /// Check every field constraint
    fn validate(&self, record: &Record) -> Result<()>;

    /// Truncate text to its limit, normalize the national ID and clamp
    /// numeric ranges
    fn truncate_to_limits(&self, record: &mut Record);
}

/// Default validator enforcing the documented field limits
#[derive(Debug, Clone, Default)]
pub struct FieldValidator {
    limits: FieldLimits,
}

impl FieldValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator with custom text limits
    pub fn with_limits(limits: FieldLimits) -> Self {
        Self { limits }
    }

    fn check_text(field: &str, value: &str, max: usize) -> Result<()> {
        if value.is_empty() || value.len() > max {
            return Err(BlockError::InvalidRecord(format!(
                "{} must be between 1 and {} bytes, got {}",
                field,
                max,
                value.len()
            )));
        }
        Ok(())
    }
}

impl RecordValidator for FieldValidator {
    fn limits(&self) -> &FieldLimits {
        &self.limits
    }

    fn validate(&self, record: &Record) -> Result<()> {
        if record.key == 0 || record.key > MAX_KEY {
            return Err(BlockError::InvalidRecord(format!(
                "key must be between 1 and {}, got {}",
                MAX_KEY, record.key
            )));
        }

        Self::check_text("name", &record.name, self.limits.name)?;

        if record.national_id.len() != NATIONAL_ID_LEN
            || !record.national_id.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(BlockError::InvalidRecord(format!(
                "national id must be exactly {} digits, got {:?}",
                NATIONAL_ID_LEN, record.national_id
            )));
        }

        Self::check_text("program", &record.program, self.limits.program)?;
        Self::check_text("guardian_a", &record.guardian_a, self.limits.guardian)?;
        Self::check_text("guardian_b", &record.guardian_b, self.limits.guardian)?;

        if !(MIN_ENROLLMENT_YEAR..=MAX_ENROLLMENT_YEAR).contains(&record.enrollment_year) {
            return Err(BlockError::InvalidRecord(format!(
                "enrollment year must have 4 digits, got {}",
                record.enrollment_year
            )));
        }

        if !record.score.is_finite() || record.score < MIN_SCORE || record.score > MAX_SCORE {
            return Err(BlockError::InvalidRecord(format!(
                "score must be between {:.2} and {:.2}, got {}",
                MIN_SCORE, MAX_SCORE, record.score
            )));
        }

        Ok(())
    }

    fn truncate_to_limits(&self, record: &mut Record) {
        truncate_utf8(&mut record.name, self.limits.name);
        truncate_utf8(&mut record.program, self.limits.program);
        truncate_utf8(&mut record.guardian_a, self.limits.guardian);
        truncate_utf8(&mut record.guardian_b, self.limits.guardian);

        if record.national_id.len() > NATIONAL_ID_LEN {
            truncate_utf8(&mut record.national_id, NATIONAL_ID_LEN);
        } else if record.national_id.len() < NATIONAL_ID_LEN {
            let padding = "0".repeat(NATIONAL_ID_LEN - record.national_id.len());
            record.national_id.insert_str(0, &padding);
        }

        let digits = record.key.to_string();
        if digits.len() > MAX_KEY_DIGITS {
            // Ten-digit u32 keys keep their leading nine digits
            record.key = digits[..MAX_KEY_DIGITS].parse().unwrap_or(MAX_KEY);
        }

        record.enrollment_year = record
            .enrollment_year
            .clamp(MIN_ENROLLMENT_YEAR, MAX_ENROLLMENT_YEAR);

        if record.score.is_finite() {
            record.score = ((record.score * 100.0).round() / 100.0).clamp(MIN_SCORE, MAX_SCORE);
        }
    }
}

/// Truncate to at most `max` bytes without splitting a character
fn truncate_utf8(value: &mut String, max: usize) {
    if value.len() <= max {
        return;
    }
    let mut cut = max;
    while !value.is_char_boundary(cut) {
        cut -= 1;
    }
    value.truncate(cut);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Record {
        Record {
            key: 100_000_001,
            name: "Ada Lovelace".to_string(),
            national_id: "12345678901".to_string(),
            program: "Mathematics".to_string(),
            guardian_a: "Anne Byron".to_string(),
            guardian_b: "George Byron".to_string(),
            enrollment_year: 2020,
            score: 9.87,
        }
    }

    #[test]
    fn test_valid_record_passes() {
        assert!(FieldValidator::new().validate(&record()).is_ok());
    }

    #[test]
    fn test_rejects_zero_key_and_empty_text() {
        let validator = FieldValidator::new();

        let mut r = record();
        r.key = 0;
        assert!(matches!(validator.validate(&r), Err(BlockError::InvalidRecord(_))));

        let mut r = record();
        r.program.clear();
        assert!(matches!(validator.validate(&r), Err(BlockError::InvalidRecord(_))));
    }

    #[test]
    fn test_hash_is_ordinary_text() {
        let mut r = record();
        r.name = "Item #".to_string();
        assert!(FieldValidator::new().validate(&r).is_ok());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let mut r = record();
        r.name = "é".repeat(40); // 80 bytes
        FieldValidator::new().truncate_to_limits(&mut r);
        assert_eq!(r.name.len(), 50);
        assert_eq!(r.name.chars().count(), 25);
    }

    #[test]
    fn test_truncate_normalizes_numbers_and_id() {
        let mut r = record();
        r.key = 1_234_567_890;
        r.national_id = "123".to_string();
        r.enrollment_year = 99;
        r.score = 12.345;
        FieldValidator::new().truncate_to_limits(&mut r);

        assert_eq!(r.key, 123_456_789);
        assert_eq!(r.national_id, "00000000123");
        assert_eq!(r.enrollment_year, 1000);
        assert_eq!(r.score, 10.0);
    }

    #[test]
    fn test_truncate_rounds_score_to_hundredths() {
        let mut r = record();
        r.score = 7.456;
        FieldValidator::new().truncate_to_limits(&mut r);
        assert_eq!(r.score, 7.46);
    }
}
