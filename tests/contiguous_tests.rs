//! Tests for the variable-width contiguous layout
//!
//! These tests verify:
//! - Records never cross a block boundary
//! - Oversized records fail with a configuration error
//! - Lookups and scans over zero padding

mod common;

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};

use blockrec::{BlockError, FieldLimits, Layout, RecordFile};

use common::{
    config, open, open_with_limits, record, record_of_variable_size, record_with_lengths,
    setup_temp_file,
};

// =============================================================================
// Packing Tests
// =============================================================================

#[test]
fn test_record_that_does_not_fit_moves_to_next_block() {
    let (_temp, path) = setup_temp_file();
    let file = open(&path, Layout::Contiguous, 100);
    let records: Vec<_> = (1..=3).map(|k| record_of_variable_size(k, 60)).collect();

    let stats = file.write_all(&records).unwrap();

    assert_eq!(stats.total_blocks, 3);
    for block in &stats.blocks {
        assert_eq!(block.bytes_used, 60);
        assert_eq!(block.record_count, 1);
    }
    assert!((stats.efficiency - 60.0).abs() < 1e-9);
}

#[test]
fn test_small_records_share_a_block() {
    let (_temp, path) = setup_temp_file();
    let file = open(&path, Layout::Contiguous, 200);
    let records: Vec<_> = (1..=5).map(|k| record_of_variable_size(k, 50)).collect();

    let stats = file.write_all(&records).unwrap();

    let counts: Vec<_> = stats.blocks.iter().map(|b| b.record_count).collect();
    assert_eq!(counts, vec![4, 1]);
    assert_eq!(stats.blocks[0].bytes_used, 200);
    assert_eq!(stats.partial_blocks, 1);
}

#[test]
fn test_oversized_record_is_a_config_error() {
    let (_temp, path) = setup_temp_file();
    let limits = FieldLimits {
        name: 200,
        ..FieldLimits::default()
    };
    let file = open_with_limits(&path, Layout::Contiguous, 200, limits);
    let big = record_with_lengths(77, 200, 3, 2, 2);
    assert_eq!(big.variable_size(), 250);

    let result = file.write_all(&[record(1), big]);

    match result {
        Err(BlockError::Config(message)) => {
            assert!(message.contains("250"), "{}", message);
            assert!(message.contains("200"), "{}", message);
            assert!(message.contains("key 77"), "{}", message);
        }
        other => panic!("expected a configuration error, got {:?}", other),
    }
    // Nothing is written when packing fails
    assert!(!path.exists());
}

#[test]
fn test_record_filling_block_exactly() {
    let (_temp, path) = setup_temp_file();
    let file = open(&path, Layout::Contiguous, 120);

    let stats = file
        .write_all(&[record_of_variable_size(1, 120), record_of_variable_size(2, 60)])
        .unwrap();

    assert_eq!(stats.total_blocks, 2);
    assert_eq!(stats.blocks[0].bytes_used, 120);
    assert_eq!(stats.blocks[1].bytes_used, 60);
}

#[test]
fn test_block_below_smallest_record_is_rejected() {
    let (_temp, path) = setup_temp_file();

    let result = RecordFile::open(config(&path, Layout::Contiguous, 46));
    assert!(matches!(result, Err(BlockError::Config(_))));

    assert!(RecordFile::open(config(&path, Layout::Contiguous, 47)).is_ok());
}

// =============================================================================
// Read and Lookup Tests
// =============================================================================

#[test]
fn test_read_all_preserves_order() {
    let (_temp, path) = setup_temp_file();
    let file = open(&path, Layout::Contiguous, 256);
    let records: Vec<_> = (1..=20).map(|k| record_of_variable_size(k, 47 + k as usize)).collect();
    file.write_all(&records).unwrap();

    assert_eq!(file.read_all().unwrap(), records);
}

#[test]
fn test_find_by_key() {
    let (_temp, path) = setup_temp_file();
    let file = open(&path, Layout::Contiguous, 256);
    let records: Vec<_> = (500..540).map(record).collect();
    file.write_all(&records).unwrap();

    assert_eq!(file.find_by_key(539).unwrap(), records[39]);
    assert!(matches!(file.find_by_key(540), Err(BlockError::KeyNotFound(540))));
}

#[test]
fn test_broken_length_prefix_is_reported() {
    let (_temp, path) = setup_temp_file();
    let file = open(&path, Layout::Contiguous, 256);
    file.write_all(&[record(1), record(2)]).unwrap();

    // Name length of the first record now points past the block
    let mut raw = OpenOptions::new().write(true).open(&path).unwrap();
    raw.seek(SeekFrom::Start(4)).unwrap();
    raw.write_all(&5000u32.to_le_bytes()).unwrap();
    drop(raw);

    assert!(file.read_all().unwrap().is_empty());
    assert!(matches!(file.find_by_key(2), Err(BlockError::Decode(_))));

    let stats = file.stats().unwrap();
    assert_eq!(stats.total_records(), 0);
    assert_eq!(stats.corrupt_records, 1);
}
