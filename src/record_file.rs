//! Record File Module
//!
//! Facade tying a `Config` to the layout strategy it selects.
//!
//! ## Responsibilities
//! - Build the storage strategy for the configured layout
//! - Hold the validator shared by the codec and the generator
//! - Route every operation to the configured data file

use std::path::Path;
use std::sync::Arc;

use crate::config::{Config, Layout};
use crate::error::{BlockError, Result};
use crate::record::{FieldValidator, Record, RecordValidator, DEFAULT_FIRST_KEY, MAX_KEY};
use crate::stats::StorageStats;
use crate::storage::{open_strategy, StorageStrategy};

/// A block-structured record file
///
/// Nothing is held open between calls. Every operation opens the data
/// file, finishes its work and drops the handle before returning.
pub struct RecordFile {
    config: Config,
    validator: Arc<dyn RecordValidator>,
    strategy: Box<dyn StorageStrategy>,
}

impl RecordFile {
    /// Open with the default field limits
    ///
    /// Fails with `Config` when the block size cannot hold the smallest
    /// unit the layout writes.
    pub fn open(config: Config) -> Result<Self> {
        Self::with_validator(config, Arc::new(FieldValidator::new()))
    }

    /// Open with a caller-supplied validator (and therefore field limits)
    pub fn with_validator(config: Config, validator: Arc<dyn RecordValidator>) -> Result<Self> {
        let strategy = open_strategy(&config, Arc::clone(&validator))?;

        tracing::debug!(
            "Opened {} ({} layout, {}-byte blocks)",
            config.data_file.display(),
            config.layout,
            config.block_size
        );

        Ok(Self {
            config,
            validator,
            strategy,
        })
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Replace the file's contents with `records`
    pub fn write_all(&self, records: &[Record]) -> Result<StorageStats> {
        self.strategy.write_all(self.path(), records)
    }

    /// Rewrite the file with `records` after the existing ones
    pub fn append(&self, records: &[Record]) -> Result<StorageStats> {
        self.strategy.append(self.path(), records)
    }

    pub fn find_by_key(&self, key: u32) -> Result<Record> {
        self.strategy.find_by_key(self.path(), key)
    }

    pub fn read_all(&self) -> Result<Vec<Record>> {
        self.strategy.read_all(self.path())
    }

    /// Statistics re-derived from the bytes on disk
    pub fn stats(&self) -> Result<StorageStats> {
        self.strategy.stats(self.path())
    }

    /// First key free for new records: one past the largest stored key, or
    /// `DEFAULT_FIRST_KEY` when the file is missing or empty
    pub fn next_key(&self) -> Result<u32> {
        let records = match self.read_all() {
            Ok(records) => records,
            Err(BlockError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e),
        };

        match records.iter().map(|r| r.key).max() {
            None => Ok(DEFAULT_FIRST_KEY),
            Some(MAX_KEY) => Err(BlockError::Config(format!(
                "Key space exhausted: {} already holds key {}",
                self.path().display(),
                MAX_KEY
            ))),
            Some(key) => Ok(key + 1),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn validator(&self) -> &dyn RecordValidator {
        self.validator.as_ref()
    }

    pub fn layout(&self) -> Layout {
        self.strategy.layout()
    }

    pub fn path(&self) -> &Path {
        &self.config.data_file
    }
}

impl std::fmt::Debug for RecordFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordFile")
            .field("config", &self.config)
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}
