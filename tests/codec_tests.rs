//! Tests for the record codecs
//!
//! These tests verify:
//! - Fixed-width byte layout and '#' padding
//! - Variable-width length prefixes
//! - Normalization before encode, validation after decode

mod common;

use std::sync::Arc;

use blockrec::codec::{peek_key, FixedCodec, RecordCodec, VariableCodec};
use blockrec::record::FieldValidator;
use blockrec::{BlockError, FieldLimits};

use common::{record, record_with_lengths, VARIABLE_OVERHEAD};

fn fixed_codec() -> FixedCodec {
    FixedCodec::new(Arc::new(FieldValidator::new()))
}

fn variable_codec() -> VariableCodec {
    VariableCodec::new(Arc::new(FieldValidator::new()))
}

// =============================================================================
// Fixed-Width Tests
// =============================================================================

#[test]
fn test_fixed_record_size_with_default_limits() {
    assert_eq!(fixed_codec().record_size(), 167);
}

#[test]
fn test_fixed_record_size_follows_limits() {
    let limits = FieldLimits {
        name: 38,
        program: 25,
        guardian: 25,
    };
    let codec = FixedCodec::new(Arc::new(FieldValidator::with_limits(limits)));

    assert_eq!(codec.record_size(), 140);
}

#[test]
fn test_fixed_layout_pads_text_with_hash() {
    let codec = fixed_codec();
    let mut rec = record(123_456_789);
    rec.name = "Ann".to_string();

    let bytes = codec.encode(&rec).unwrap();

    assert_eq!(bytes.len(), 167);
    assert_eq!(&bytes[0..4], &123_456_789u32.to_le_bytes());
    assert_eq!(&bytes[4..7], b"Ann");
    assert!(bytes[7..54].iter().all(|&b| b == b'#'));
    assert_eq!(&bytes[54..65], b"12345678901");
    // Score is stored as hundredths
    assert_eq!(&bytes[159..167], &925u64.to_le_bytes());
}

#[test]
fn test_fixed_roundtrip_strips_padding() {
    let codec = fixed_codec();
    let rec = record(42);

    let decoded = codec.decode(&codec.encode(&rec).unwrap()).unwrap();
    assert_eq!(decoded, rec);
}

#[test]
fn test_fixed_decode_rejects_short_buffer() {
    let codec = fixed_codec();
    let bytes = codec.encode(&record(42)).unwrap();

    let result = codec.decode(&bytes[..100]);
    assert!(matches!(result, Err(BlockError::Decode(_))));
}

// =============================================================================
// Variable-Width Tests
// =============================================================================

#[test]
fn test_variable_size_is_overhead_plus_text() {
    let codec = variable_codec();
    let rec = record_with_lengths(7, 10, 5, 3, 4);

    let bytes = codec.encode(&rec).unwrap();

    assert_eq!(bytes.len(), VARIABLE_OVERHEAD + 22);
    assert_eq!(bytes.len(), rec.variable_size());
    assert_eq!(codec.frame_len(&bytes).unwrap(), bytes.len());
}

#[test]
fn test_variable_layout_uses_length_prefixes() {
    let codec = variable_codec();
    let rec = record_with_lengths(7, 2, 1, 1, 1);

    let bytes = codec.encode(&rec).unwrap();

    assert_eq!(&bytes[0..4], &7u32.to_le_bytes());
    assert_eq!(&bytes[4..8], &2u32.to_le_bytes());
    assert_eq!(&bytes[8..10], b"nn");
    assert_eq!(&bytes[10..21], b"98765432109");
    assert_eq!(&bytes[21..25], &1u32.to_le_bytes());
}

#[test]
fn test_variable_roundtrip_keeps_utf8() {
    let codec = variable_codec();
    let mut rec = record(99);
    rec.name = "Zoë Ångström".to_string();

    let decoded = codec.decode(&codec.encode(&rec).unwrap()).unwrap();
    assert_eq!(decoded.name, "Zoë Ångström");
}

#[test]
fn test_variable_decode_rejects_prefix_past_end() {
    let codec = variable_codec();
    let mut bytes = codec.encode(&record(5)).unwrap().to_vec();
    bytes[4..8].copy_from_slice(&10_000u32.to_le_bytes());

    assert!(matches!(codec.decode(&bytes), Err(BlockError::Decode(_))));
    assert!(matches!(codec.frame_len(&bytes), Err(BlockError::Decode(_))));
}

// =============================================================================
// Normalization and Validation Tests
// =============================================================================

#[test]
fn test_encode_truncates_long_text() {
    let codec = variable_codec();
    let mut rec = record(1);
    rec.name = "x".repeat(80);

    let decoded = codec.decode(&codec.encode(&rec).unwrap()).unwrap();
    assert_eq!(decoded.name.len(), 50);
}

#[test]
fn test_encode_pads_short_national_id() {
    let codec = fixed_codec();
    let mut rec = record(1);
    rec.national_id = "12345".to_string();

    let decoded = codec.decode(&codec.encode(&rec).unwrap()).unwrap();
    assert_eq!(decoded.national_id, "00000012345");
}

#[test]
fn test_encode_rejects_invalid_record() {
    let codec = variable_codec();
    let mut rec = record(1);
    rec.program = String::new();

    assert!(matches!(codec.encode(&rec), Err(BlockError::InvalidRecord(_))));
}

#[test]
fn test_encode_rejects_zero_key() {
    let codec = fixed_codec();
    assert!(matches!(codec.encode(&record(0)), Err(BlockError::InvalidRecord(_))));
}

#[test]
fn test_decode_reports_invalid_fields_as_decode_error() {
    let codec = fixed_codec();
    let mut bytes = codec.encode(&record(1)).unwrap().to_vec();
    // National id with a letter in it
    bytes[54] = b'X';

    assert!(matches!(codec.decode(&bytes), Err(BlockError::Decode(_))));
}

#[test]
fn test_peek_key() {
    let bytes = variable_codec().encode(&record(31_337)).unwrap();

    assert_eq!(peek_key(&bytes), Some(31_337));
    assert_eq!(peek_key(&[0, 0, 0, 0]), Some(0));
    assert_eq!(peek_key(&[1, 2]), None);
}

// =============================================================================
// Pad Byte Tests
// =============================================================================

#[test]
fn test_variable_roundtrip_keeps_trailing_hash() {
    let codec = variable_codec();
    let mut rec = record(3);
    rec.name = "Item #".to_string();
    rec.guardian_b = "##".to_string();

    let decoded = codec.decode(&codec.encode(&rec).unwrap()).unwrap();
    assert_eq!(decoded, rec);
}

#[test]
fn test_variable_truncation_may_end_in_hash() {
    let codec = variable_codec();
    let mut rec = record(3);
    rec.name = format!("{}#tail", "a".repeat(49));

    let decoded = codec.decode(&codec.encode(&rec).unwrap()).unwrap();
    assert_eq!(decoded.name, format!("{}#", "a".repeat(49)));
}

#[test]
fn test_fixed_rejects_text_ending_in_pad_byte() {
    let codec = fixed_codec();
    let mut rec = record(3);
    rec.program = "Item #".to_string();

    assert!(matches!(codec.encode(&rec), Err(BlockError::InvalidRecord(_))));
}

#[test]
fn test_fixed_allows_hash_inside_text() {
    let codec = fixed_codec();
    let mut rec = record(3);
    rec.name = "No #1 fan".to_string();

    let decoded = codec.decode(&codec.encode(&rec).unwrap()).unwrap();
    assert_eq!(decoded.name, "No #1 fan");
}
