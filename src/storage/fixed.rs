//! Fixed-width layout
//!
//! Every record occupies `record_size` bytes and a block holds
//! `floor(block_size / record_size)` slots. The tail of a block that is too
//! short for another slot stays as padding. A slot whose key reads as 0 is
//! empty.

use std::path::Path;
use std::sync::Arc;

use crate::codec::{peek_key, FixedCodec, RecordCodec};
use crate::config::Layout;
use crate::error::{BlockError, Result};
use crate::record::{Record, RecordValidator, EMPTY_KEY};
use crate::stats::{BlockUsage, StatsCollector, StorageStats};

use super::{BlockAccumulator, BlockStore, StorageStrategy};

/// Storage strategy for fixed-width records
#[derive(Debug)]
pub struct FixedStorage {
    store: BlockStore,
    codec: FixedCodec,
}

impl FixedStorage {
    /// Fails with `Config` if a block cannot hold one record
    pub fn new(block_size: usize, validator: Arc<dyn RecordValidator>) -> Result<Self> {
        let codec = FixedCodec::new(validator);
        let record_size = codec.record_size();

        if block_size < record_size {
            return Err(BlockError::Config(format!(
                "Block size ({} bytes) is smaller than one fixed record ({} bytes)",
                block_size, record_size
            )));
        }

        Ok(Self {
            store: BlockStore::new(block_size),
            codec,
        })
    }

    pub fn record_size(&self) -> usize {
        self.codec.record_size()
    }

    /// Record slots per block
    pub fn records_per_block(&self) -> usize {
        self.store.block_size() / self.codec.record_size()
    }

    /// Occupied slots of a block as `(slot, bytes)`
    fn occupied_slots<'a>(&self, block: &'a [u8]) -> impl Iterator<Item = (usize, &'a [u8])> {
        block
            .chunks_exact(self.codec.record_size())
            .enumerate()
            .filter(|(_, slot)| peek_key(slot).is_some_and(|key| key != EMPTY_KEY))
    }
}

impl StorageStrategy for FixedStorage {
    fn layout(&self) -> Layout {
        Layout::Fixed
    }

    fn block_size(&self) -> usize {
        self.store.block_size()
    }

    fn write_all(&self, path: &Path, records: &[Record]) -> Result<StorageStats> {
        let packed = records
            .iter()
            .try_fold(BlockAccumulator::new(self.block_size()), |mut acc, record| {
                let encoded = self.codec.encode(record)?;
                if encoded.len() > acc.free() {
                    acc.flush();
                }
                acc.append(&encoded, true)?;
                Ok::<_, BlockError>(acc)
            })?
            .finish();

        self.store.create_and_write_all(path, &packed.blocks)?;

        tracing::info!(
            "Wrote {} fixed records ({} per block) into {} blocks",
            records.len(),
            self.records_per_block(),
            packed.stats.total_blocks
        );

        Ok(packed.stats)
    }

    fn read_all(&self, path: &Path) -> Result<Vec<Record>> {
        let mut reader = self.store.open(path)?;
        let mut records = Vec::new();

        for block in reader.blocks() {
            let (index, block) = block?;
            for (slot, bytes) in self.occupied_slots(&block) {
                match self.codec.decode(bytes) {
                    Ok(record) => records.push(record),
                    Err(e) => tracing::warn!("Skipping block {} slot {}: {}", index, slot, e),
                }
            }
        }

        Ok(records)
    }

    fn find_by_key(&self, path: &Path, key: u32) -> Result<Record> {
        let mut reader = self.store.open(path)?;

        for block in reader.blocks() {
            let (index, block) = block?;
            for (slot, bytes) in self.occupied_slots(&block) {
                if peek_key(bytes) == Some(key) {
                    tracing::debug!("Key {} found in block {} slot {}", key, index, slot);
                    return self.codec.decode(bytes);
                }
            }
        }

        Err(BlockError::KeyNotFound(key))
    }

    fn stats(&self, path: &Path) -> Result<StorageStats> {
        let mut reader = self.store.open(path)?;
        let mut collector = StatsCollector::new(self.block_size());

        for block in reader.blocks() {
            let (index, block) = block?;
            let mut usage = BlockUsage::default();

            for (slot, bytes) in self.occupied_slots(&block) {
                usage.bytes_used += bytes.len();
                match self.codec.decode(bytes) {
                    Ok(_) => usage.record_count += 1,
                    Err(e) => {
                        tracing::warn!("Corrupt record in block {} slot {}: {}", index, slot, e);
                        collector.note_corrupt();
                    }
                }
            }

            collector.push(usage);
        }

        Ok(collector.finish())
    }
}
