//! Variable-width record codec

use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Result;
use crate::record::{Record, RecordValidator, NATIONAL_ID_LEN, SCORE_WIDTH, U32_WIDTH};

use super::{normalized, utf8, validated, FieldReader, RecordCodec};

/// Codec where text fields carry a 4-byte length prefix
#[derive(Debug, Clone)]
pub struct VariableCodec {
    validator: Arc<dyn RecordValidator>,
}

impl VariableCodec {
    pub fn new(validator: Arc<dyn RecordValidator>) -> Self {
        Self { validator }
    }

    /// Encoded length of the record at the start of `bytes`, derived from
    /// its length prefixes only. Field contents are not validated, so this
    /// can step over a record without paying for a full decode.
    pub fn frame_len(&self, bytes: &[u8]) -> Result<usize> {
        let mut reader = FieldReader::new(bytes);
        reader.bytes(U32_WIDTH, "key")?;
        reader.prefixed("name")?;
        reader.bytes(NATIONAL_ID_LEN, "national id")?;
        reader.prefixed("program")?;
        reader.prefixed("guardian_a")?;
        reader.prefixed("guardian_b")?;
        reader.bytes(U32_WIDTH + SCORE_WIDTH, "enrollment year and score")?;
        Ok(reader.consumed())
    }

    fn put_prefixed(buf: &mut BytesMut, value: &str) {
        buf.put_u32_le(value.len() as u32);
        buf.put_slice(value.as_bytes());
    }
}

impl RecordCodec for VariableCodec {
    fn encode(&self, record: &Record) -> Result<Bytes> {
        let record = normalized(self.validator.as_ref(), record)?;

        let mut buf = BytesMut::with_capacity(record.variable_size());
        buf.put_u32_le(record.key);
        Self::put_prefixed(&mut buf, &record.name);
        buf.put_slice(record.national_id.as_bytes());
        Self::put_prefixed(&mut buf, &record.program);
        Self::put_prefixed(&mut buf, &record.guardian_a);
        Self::put_prefixed(&mut buf, &record.guardian_b);
        buf.put_u32_le(record.enrollment_year);
        buf.put_u64_le(record.scaled_score());

        Ok(buf.freeze())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Record> {
        let mut reader = FieldReader::new(bytes);

        let key = reader.u32("key")?;
        let name = utf8(reader.prefixed("name")?, "name")?;
        let national_id = reader.text(NATIONAL_ID_LEN, "national id")?;
        let program = utf8(reader.prefixed("program")?, "program")?;
        let guardian_a = utf8(reader.prefixed("guardian_a")?, "guardian_a")?;
        let guardian_b = utf8(reader.prefixed("guardian_b")?, "guardian_b")?;
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
