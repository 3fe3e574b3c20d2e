//! Shared helpers for the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use blockrec::record::{FieldValidator, RecordValidator};
use blockrec::{Config, FieldLimits, Layout, Record, RecordFile};
use tempfile::TempDir;

/// Fixed overhead of a variable-width record with every text empty
pub const VARIABLE_OVERHEAD: usize = 43;

pub fn setup_temp_file() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("records.dat");
    (temp_dir, path)
}

pub fn config(path: &Path, layout: Layout, block_size: usize) -> Config {
    Config::builder()
        .data_file(path)
        .layout(layout)
        .block_size(block_size)
        .build()
}

pub fn validator(limits: FieldLimits) -> Arc<dyn RecordValidator> {
    Arc::new(FieldValidator::with_limits(limits))
}

pub fn open(path: &Path, layout: Layout, block_size: usize) -> RecordFile {
    RecordFile::open(config(path, layout, block_size)).unwrap()
}

pub fn open_with_limits(
    path: &Path,
    layout: Layout,
    block_size: usize,
    limits: FieldLimits,
) -> RecordFile {
    RecordFile::with_validator(config(path, layout, block_size), validator(limits)).unwrap()
}

/// A valid record with short text fields
pub fn record(key: u32) -> Record {
    Record {
        key,
        name: "Ada Lovelace".to_string(),
        national_id: "12345678901".to_string(),
        program: "Mathematics".to_string(),
        guardian_a: "Anne Byron".to_string(),
        guardian_b: "George Byron".to_string(),
        enrollment_year: 2021,
        score: 9.25,
    }
}

/// A valid record whose text fields have exactly the given byte lengths
pub fn record_with_lengths(
    key: u32,
    name: usize,
    program: usize,
    guardian_a: usize,
    guardian_b: usize,
) -> Record {
    Record {
        key,
        name: "n".repeat(name),
        national_id: "98765432109".to_string(),
        program: "p".repeat(program),
        guardian_a: "a".repeat(guardian_a),
        guardian_b: "b".repeat(guardian_b),
        enrollment_year: 2019,
        score: 7.5,
    }
}

/// A record whose variable-width encoding is exactly `size` bytes
pub fn record_of_variable_size(key: u32, size: usize) -> Record {
    let text = size - VARIABLE_OVERHEAD;
    let guardian = (text / 8).clamp(1, 30);
    let program = (text / 8).clamp(1, 30);
    let name = text - program - 2 * guardian;
    record_with_lengths(key, name, program, guardian, guardian)
}
