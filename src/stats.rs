//! Stats Module
//!
//! Per-block and aggregate occupancy statistics.
//!
//! ## Responsibilities
//! - Freeze a block's usage into a `BlockStats` entry when it is flushed
//! - Aggregate block entries into file-level `StorageStats`
//! - Serve both the write path and the re-scan path, so statistics computed
//!   while writing and statistics re-derived from disk agree
//!
//! The collector never formats anything; reporters consume `StorageStats`.

use serde::{Deserialize, Serialize};

/// Raw usage of one block as measured by a layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockUsage {
    /// Bytes occupied by records, record slots or chunks (headers included)
    pub bytes_used: usize,
    /// Records attributed to this block
    pub record_count: usize,
}

/// Statistics of one block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStats {
    /// Zero-based position of the block in the file
    pub block_number: usize,
    pub bytes_used: usize,
    /// Always the configured block size
    pub bytes_total: usize,
    /// `bytes_used / bytes_total * 100`
    pub occupancy: f64,
    pub record_count: usize,
}

impl BlockStats {
    /// Occupied but not full
    pub fn is_partial(&self) -> bool {
        self.occupancy > 0.0 && self.occupancy < 100.0
    }
}

/// Aggregate statistics of a whole file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageStats {
    pub total_blocks: usize,
    pub total_bytes_used: usize,
    pub total_bytes_available: usize,
    /// Blocks with occupancy strictly between 0 and 100
    pub partial_blocks: usize,
    /// `total_bytes_used / total_bytes_available * 100`
    pub efficiency: f64,
    /// Records (or fragment chains) skipped because they could not be decoded
    pub corrupt_records: usize,
    pub blocks: Vec<BlockStats>,
}

impl StorageStats {
    /// Total number of records attributed to blocks
    pub fn total_records(&self) -> usize {
        self.blocks.iter().map(|b| b.record_count).sum()
    }

    /// Mean of the per-block occupancy rates
    pub fn average_occupancy(&self) -> f64 {
        if self.blocks.is_empty() {
            return 0.0;
        }
        self.blocks.iter().map(|b| b.occupancy).sum::<f64>() / self.blocks.len() as f64
    }
}

/// Accumulates block usage into `StorageStats`
#[derive(Debug)]
pub struct StatsCollector {
    block_size: usize,
    blocks: Vec<BlockStats>,
    corrupt_records: usize,
}

impl StatsCollector {
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            blocks: Vec::new(),
            corrupt_records: 0,
        }
    }

    /// Freeze the usage of the next block in file order
    pub fn push(&mut self, usage: BlockUsage) {
        debug_assert!(usage.bytes_used <= self.block_size);

        let occupancy = if self.block_size == 0 {
            0.0
        } else {
            usage.bytes_used as f64 / self.block_size as f64 * 100.0
        };

        self.blocks.push(BlockStats {
            block_number: self.blocks.len(),
            bytes_used: usage.bytes_used,
            bytes_total: self.block_size,
            occupancy,
            record_count: usage.record_count,
        });
    }

    /// Count one record skipped during a scan
    pub fn note_corrupt(&mut self) {
        self.corrupt_records += 1;
    }

    pub fn finish(self) -> StorageStats {
        let total_blocks = self.blocks.len();
        let total_bytes_used: usize = self.blocks.iter().map(|b| b.bytes_used).sum();
        let total_bytes_available = total_blocks * self.block_size;
        let partial_blocks = self.blocks.iter().filter(|b| b.is_partial()).count();

        let efficiency = if total_bytes_available == 0 {
            0.0
        } else {
            total_bytes_used as f64 / total_bytes_available as f64 * 100.0
        };

        StorageStats {
            total_blocks,
            total_bytes_used,
            total_bytes_available,
            partial_blocks,
            efficiency,
            corrupt_records: self.corrupt_records,
            blocks: self.blocks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_collector() {
        let stats = StatsCollector::new(512).finish();
        assert_eq!(stats.total_blocks, 0);
        assert_eq!(stats.efficiency, 0.0);
        assert_eq!(stats.average_occupancy(), 0.0);
    }

    #[test]
    fn test_partial_and_full_blocks() {
        let mut collector = StatsCollector::new(100);
        collector.push(BlockUsage { bytes_used: 100, record_count: 2 });
        collector.push(BlockUsage { bytes_used: 50, record_count: 1 });
        collector.push(BlockUsage { bytes_used: 0, record_count: 0 });
        let stats = collector.finish();

        assert_eq!(stats.total_blocks, 3);
        assert_eq!(stats.total_bytes_used, 150);
        assert_eq!(stats.total_bytes_available, 300);
        assert_eq!(stats.partial_blocks, 1);
        assert_eq!(stats.efficiency, 50.0);
        assert_eq!(stats.total_records(), 3);
        assert_eq!(stats.blocks[1].block_number, 1);
        assert_eq!(stats.blocks[1].occupancy, 50.0);
    }
}
