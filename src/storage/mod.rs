//! Storage Module
//!
//! Block-packing strategies that persist records to a flat file.
//!
//! ## Responsibilities
//! - Pack encoded records into fixed-size, zero-padded blocks
//! - Read records back, reconstructing fragment chains
//! - Linear point lookups by key (no index)
//! - Re-derive occupancy statistics from the bytes on disk
//!
//! ## File Format
//! ```text
//! ┌──────────────┬──────────────┬──────────────┬─────┐
//! │   Block 0    │   Block 1    │   Block 2    │ ... │
//! │ (block_size) │ (block_size) │ (block_size) │     │
//! └──────────────┴──────────────┴──────────────┴─────┘
//!   no header, no index; block n at offset n * block_size
//! ```
//!
//! ## Layouts
//! - **Fixed**: `floor(block_size / record_size)` slots per block
//! - **Contiguous**: variable records, never split across blocks
//! - **Fragmented**: variable records split into chunks
//!   `[Flag (1)][Len u32 (4)][Payload]` over consecutive blocks

mod accumulator;
mod block_store;
pub mod chunk;
mod contiguous;
mod fixed;
mod fragmented;

use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::config::{Config, Layout};
use crate::error::{BlockError, Result};
use crate::record::{Record, RecordValidator};
use crate::stats::StorageStats;

pub use accumulator::{BlockAccumulator, PackedBlocks};
pub use block_store::{BlockReader, BlockStore};
pub use contiguous::ContiguousStorage;
pub use fixed::FixedStorage;
pub use fragmented::{AssembledChain, FragmentedStorage};

/// Operations every block-packing layout provides
///
/// Each call opens the file, does its work and releases the handle before
/// returning. Nothing is cached between calls.
pub trait StorageStrategy: Send + Sync {
    /// Which layout this strategy writes
    fn layout(&self) -> Layout;

    fn block_size(&self) -> usize;

    /// Replace the contents of `path` with `records`; returns the
    /// statistics frozen as each block was flushed
    fn write_all(&self, path: &Path, records: &[Record]) -> Result<StorageStats>;

    /// Every decodable record in file order; corrupt records are skipped
    fn read_all(&self, path: &Path) -> Result<Vec<Record>>;

    /// First record whose key equals `key`
    fn find_by_key(&self, path: &Path, key: u32) -> Result<Record>;

    /// Statistics re-derived by scanning the file
    fn stats(&self, path: &Path) -> Result<StorageStats>;

    /// Read every existing record, add `records` after them and rewrite
    /// the whole file. A missing file is treated as empty.
    fn append(&self, path: &Path, records: &[Record]) -> Result<StorageStats> {
        let mut all = match self.read_all(path) {
            Ok(existing) => existing,
            Err(BlockError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e),
        };

        tracing::debug!(
            "Appending {} records to {} existing in {}",
            records.len(),
            all.len(),
            path.display()
        );

        all.extend_from_slice(records);
        self.write_all(path, &all)
    }
}

/// Build the strategy selected by `config.layout`
pub fn open_strategy(
    config: &Config,
    validator: Arc<dyn RecordValidator>,
) -> Result<Box<dyn StorageStrategy>> {
    config.validate()?;

    let strategy: Box<dyn StorageStrategy> = match config.layout {
        Layout::Fixed => Box::new(FixedStorage::new(config.block_size, validator)?),
        Layout::Contiguous => Box::new(ContiguousStorage::new(config.block_size, validator)?),
        Layout::Fragmented => Box::new(
            FragmentedStorage::new(config.block_size, validator)?
                .with_dangling_policy(config.dangling_chunks),
        ),
    };

    Ok(strategy)
}
