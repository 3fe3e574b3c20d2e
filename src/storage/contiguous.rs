//! Variable-width contiguous layout
//!
//! Records are packed back to back. A record goes into the open block only
//! if it fits completely; otherwise the block is padded and flushed first.
//! Zero padding reads as key 0 and ends the block's record list.

use std::path::Path;
use std::sync::Arc;

use crate::codec::{peek_key, RecordCodec, VariableCodec};
use crate::config::Layout;
use crate::error::{BlockError, Result};
use crate::record::{Record, RecordValidator, EMPTY_KEY};
use crate::stats::{BlockUsage, StatsCollector, StorageStats};

use super::{BlockAccumulator, BlockStore, StorageStrategy};

/// Storage strategy for variable-width records that never span blocks
#[derive(Debug)]
pub struct ContiguousStorage {
    store: BlockStore,
    codec: VariableCodec,
}

impl ContiguousStorage {
    /// Fails with `Config` if a block cannot hold even the smallest record
    pub fn new(block_size: usize, validator: Arc<dyn RecordValidator>) -> Result<Self> {
        let min_size = validator.limits().min_variable_size();

        if block_size < min_size {
            return Err(BlockError::Config(format!(
                "Block size ({} bytes) is smaller than the smallest variable record ({} bytes)",
                block_size, min_size
            )));
        }

        Ok(Self {
            store: BlockStore::new(block_size),
            codec: VariableCodec::new(validator),
        })
    }

    fn records<'a>(&'a self, block: &'a [u8]) -> Frames<'a> {
        Frames {
            codec: &self.codec,
            block,
            offset: 0,
            done: false,
        }
    }
}

impl StorageStrategy for ContiguousStorage {
    fn layout(&self) -> Layout {
        Layout::Contiguous
    }

    fn block_size(&self) -> usize {
        self.store.block_size()
    }

    fn write_all(&self, path: &Path, records: &[Record]) -> Result<StorageStats> {
        let block_size = self.block_size();

        let packed = records
            .iter()
            .enumerate()
            .try_fold(BlockAccumulator::new(block_size), |mut acc, (index, record)| {
                let encoded = self.codec.encode(record)?;

                if encoded.len() > block_size {
                    return Err(BlockError::Config(format!(
                        "Record {} (key {}) needs {} bytes but the block size is {} bytes; \
                         increase the block size",
                        index + 1,
                        record.key,
                        encoded.len(),
                        block_size
                    )));
                }

                if encoded.len() > acc.free() {
                    acc.flush();
                }
                acc.append(&encoded, true)?;
                Ok::<_, BlockError>(acc)
            })?
            .finish();

        self.store.create_and_write_all(path, &packed.blocks)?;

        tracing::info!(
            "Wrote {} contiguous records into {} blocks ({:.2}% efficiency)",
            records.len(),
            packed.stats.total_blocks,
            packed.stats.efficiency
        );

        Ok(packed.stats)
    }

    fn read_all(&self, path: &Path) -> Result<Vec<Record>> {
        let mut reader = self.store.open(path)?;
        let mut records = Vec::new();

        for block in reader.blocks() {
            let (index, block) = block?;
            for frame in self.records(&block) {
                match frame.and_then(|(_, bytes)| self.codec.decode(bytes)) {
                    Ok(record) => records.push(record),
                    Err(e) => tracing::warn!("Skipping record in block {}: {}", index, e),
                }
            }
        }

        Ok(records)
    }

    fn find_by_key(&self, path: &Path, key: u32) -> Result<Record> {
        let mut reader = self.store.open(path)?;

        for block in reader.blocks() {
            let (index, block) = block?;
            for frame in self.records(&block) {
                let (offset, bytes) = frame?;
                if peek_key(bytes) == Some(key) {
                    tracing::debug!("Key {} found in block {} at offset {}", key, index, offset);
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

            for frame in self.records(&block) {
                let bytes = match frame {
                    Ok((_, bytes)) => bytes,
                    Err(e) => {
                        tracing::warn!("Unreadable record framing in block {}: {}", index, e);
                        collector.note_corrupt();
                        continue;
                    }
                };

                usage.bytes_used += bytes.len();
                match self.codec.decode(bytes) {
                    Ok(_) => usage.record_count += 1,
                    Err(e) => {
                        tracing::warn!("Corrupt record in block {}: {}", index, e);
                        collector.note_corrupt();
                    }
                }
            }

            collector.push(usage);
        }

        Ok(collector.finish())
    }
}

// =============================================================================
// Record frames within one block
// =============================================================================

/// Walks the records of one block using their length prefixes
///
/// Yields `(offset, bytes)` per record. Stops at zero padding, at the end of
/// the block, or after the first framing error.
struct Frames<'a> {
    codec: &'a VariableCodec,
    block: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> Iterator for Frames<'a> {
    type Item = Result<(usize, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let rest = &self.block[self.offset..];
        match peek_key(rest) {
            None | Some(EMPTY_KEY) => {
                self.done = true;
                None
            }
            Some(_) => match self.codec.frame_len(rest) {
                Ok(len) => {
                    let offset = self.offset;
                    self.offset += len;
                    Some(Ok((offset, &rest[..len])))
                }
                Err(e) => {
                    self.done = true;
                    Some(Err(e))
                }
            },
        }
    }
}
