//! Fixed-width record codec

use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{BlockError, Result};
use crate::record::{Record, RecordValidator, NATIONAL_ID_LEN, PAD_BYTE};

use super::{normalized, utf8, validated, FieldReader, RecordCodec};

/// Codec where every field occupies its maximum width
#[derive(Debug, Clone)]
pub struct FixedCodec {
    validator: Arc<dyn RecordValidator>,
    record_size: usize,
}

impl FixedCodec {
    pub fn new(validator: Arc<dyn RecordValidator>) -> Self {
        let record_size = validator.limits().fixed_record_size();
        Self {
            validator,
            record_size,
        }
    }

    /// Size of every encoded record
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    fn put_padded(buf: &mut BytesMut, value: &str, width: usize) {
        buf.put_slice(value.as_bytes());
        buf.put_bytes(PAD_BYTE, width - value.len());
    }

    /// Trailing pad bytes would be stripped on decode, so such text
    /// cannot be stored in this layout
    fn check_unpadded(field: &str, value: &str) -> Result<()> {
        if value.as_bytes().last() == Some(&PAD_BYTE) {
            return Err(BlockError::InvalidRecord(format!(
                "{} must not end with the pad byte '{}' in the fixed layout",
                field, PAD_BYTE as char
            )));
        }
        Ok(())
    }

    fn take_padded(reader: &mut FieldReader<'_>, width: usize, field: &str) -> Result<String> {
        let raw = reader.bytes(width, field)?;
        let end = raw
            .iter()
            .rposition(|&b| b != PAD_BYTE)
            .map_or(0, |last| last + 1);
        utf8(&raw[..end], field)
    }
}

impl RecordCodec for FixedCodec {
    fn encode(&self, record: &Record) -> Result<Bytes> {
        let record = normalized(self.validator.as_ref(), record)?;
        let limits = self.validator.limits();

        for (field, value) in [
            ("name", &record.name),
            ("program", &record.program),
            ("guardian_a", &record.guardian_a),
            ("guardian_b", &record.guardian_b),
        ] {
            Self::check_unpadded(field, value)?;
        }

        let mut buf = BytesMut::with_capacity(self.record_size);
        buf.put_u32_le(record.key);
        Self::put_padded(&mut buf, &record.name, limits.name);
        buf.put_slice(record.national_id.as_bytes());
        Self::put_padded(&mut buf, &record.program, limits.program);
        Self::put_padded(&mut buf, &record.guardian_a, limits.guardian);
        Self::put_padded(&mut buf, &record.guardian_b, limits.guardian);
        buf.put_u32_le(record.enrollment_year);
        buf.put_u64_le(record.scaled_score());

        debug_assert_eq!(buf.len(), self.record_size);
        Ok(buf.freeze())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Record> {
        if bytes.len() < self.record_size {
            return Err(BlockError::Decode(format!(
                "truncated fixed record: expected {} bytes, got {}",
                self.record_size,
                bytes.len()
            )));
        }

        let limits = self.validator.limits();
        let mut reader = FieldReader::new(&bytes[..self.record_size]);

        let key = reader.u32("key")?;
        let name = Self::take_padded(&mut reader, limits.name, "name")?;
        let national_id = reader.text(NATIONAL_ID_LEN, "national id")?;
        let program = Self::take_padded(&mut reader, limits.program, "program")?;
        let guardian_a = Self::take_padded(&mut reader, limits.guardian, "guardian_a")?;
        let guardian_b = Self::take_padded(&mut reader, limits.guardian, "guardian_b")?;
        let enrollment_year = reader.u32("enrollment year")?;
        let scaled_score = reader.u64("score")?;

        validated(
            self.validator.as_ref(),
            Record {
                key,
                name,
                national_id,
                program,
                guardian_a,
                guardian_b,
                enrollment_year,
                score: scaled_score as f64 / 100.0,
            },
        )
    }
}
