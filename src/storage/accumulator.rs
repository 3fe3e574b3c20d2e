//! Block Accumulator
//!
//! Packing state threaded through a layout's write loop. Each placement
//! step takes the accumulator by value and hands it back, so there is one
//! owner of the open block and the finished blocks at all times.

use bytes::{Bytes, BytesMut};

use crate::error::{BlockError, Result};
use crate::stats::{BlockUsage, StatsCollector, StorageStats};

/// Blocks produced by a packing run, with their write-time statistics
#[derive(Debug)]
pub struct PackedBlocks {
    /// Block contents without trailing padding
    pub blocks: Vec<Bytes>,
    pub stats: StorageStats,
}

/// Open block plus everything flushed so far
#[derive(Debug)]
pub struct BlockAccumulator {
    block_size: usize,
    current: BytesMut,
    current_records: usize,
    blocks: Vec<Bytes>,
    stats: StatsCollector,
}

impl BlockAccumulator {
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            current: BytesMut::with_capacity(block_size),
            current_records: 0,
            blocks: Vec::new(),
            stats: StatsCollector::new(block_size),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Free bytes left in the open block
    pub fn free(&self) -> usize {
        self.block_size - self.current.len()
    }

    /// Index the open block will have once flushed
    pub fn current_block(&self) -> usize {
        self.blocks.len()
    }

    /// Copy `bytes` into the open block. `starts_record` attributes a
    /// record to this block.
    pub fn append(&mut self, bytes: &[u8], starts_record: bool) -> Result<()> {
        if bytes.len() > self.free() {
            return Err(BlockError::Config(format!(
                "{} bytes do not fit in block {} ({} bytes free)",
                bytes.len(),
                self.current_block(),
                self.free()
            )));
        }

        self.current.extend_from_slice(bytes);
        if starts_record {
            self.current_records += 1;
        }
        Ok(())
    }

    /// Close the open block and freeze its statistics. An empty open
    /// block is left as is.
    pub fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }

        self.stats.push(BlockUsage {
            bytes_used: self.current.len(),
            record_count: self.current_records,
        });

        let block = std::mem::replace(&mut self.current, BytesMut::with_capacity(self.block_size));
        self.blocks.push(block.freeze());
        self.current_records = 0;
    }

    /// Flush the open block and hand back everything that was packed
    pub fn finish(mut self) -> PackedBlocks {
        self.flush();
        PackedBlocks {
            blocks: self.blocks,
            stats: self.stats.finish(),
        }
    }
}
