//! Variable-width fragmented layout
//!
//! A record is written as a chain of chunks. If its remaining bytes fit in
//! the open block after a chunk header, they become the terminal chunk;
//! otherwise the block is filled to the last byte with a continuation chunk,
//! flushed, and the rest carries on at offset 0 of the next block. A chain
//! starts right after the previous record's terminal chunk, or at the start
//! of the next block when fewer than `CHUNK_HEADER_SIZE + 1` bytes are free.
//!
//! ```text
//!   Block 0                       Block 1                 Block 2
//! ┌────────────┬───────────────┐┌──────────────────────┐┌──────────┬──────┐
//! │ 0|len|rec A│ 1|len|rec B.. ││ 1|len|..rec B..      ││ 0|len|..B│ pad  │
//! └────────────┴───────────────┘└──────────────────────┘└──────────┴──────┘
//! ```

use std::path::Path;
use std::sync::Arc;

use crate::codec::{peek_key, RecordCodec, VariableCodec};
use crate::config::{DanglingChunkPolicy, Layout};
use crate::error::{BlockError, Result};
use crate::record::{Record, RecordValidator};
use crate::stats::{BlockUsage, StatsCollector, StorageStats};

use super::chunk::{encode_chunk, Chunk, ChunkIter, CHUNK_HEADER_SIZE};
use super::{BlockAccumulator, BlockStore, StorageStrategy};

/// Storage strategy for variable-width records split across blocks
#[derive(Debug)]
pub struct FragmentedStorage {
    store: BlockStore,
    codec: VariableCodec,
    dangling: DanglingChunkPolicy,
}

impl FragmentedStorage {
    /// Fails with `Config` unless the block size exceeds the chunk header
    pub fn new(block_size: usize, validator: Arc<dyn RecordValidator>) -> Result<Self> {
        if block_size <= CHUNK_HEADER_SIZE {
            return Err(BlockError::Config(format!(
                "Block size ({} bytes) must exceed the {}-byte chunk header",
                block_size, CHUNK_HEADER_SIZE
            )));
        }

        Ok(Self {
            store: BlockStore::new(block_size),
            codec: VariableCodec::new(validator),
            dangling: DanglingChunkPolicy::default(),
        })
    }

    pub fn with_dangling_policy(mut self, policy: DanglingChunkPolicy) -> Self {
        self.dangling = policy;
        self
    }

    /// Payload bytes a chunk can carry when it has a block to itself
    pub fn payload_capacity(&self) -> usize {
        self.block_size() - CHUNK_HEADER_SIZE
    }

    /// Every complete chain in file order, with the payload exactly as it
    /// was encoded. Broken chains, framing errors and the leftover tail of a
    /// damaged record are skipped.
    pub fn chains(&self, path: &Path) -> Result<Vec<AssembledChain>> {
        let mut reader = self.store.open(path)?;
        let mut assembler = ChainAssembler::default();
        let mut chains = Vec::new();

        for block in reader.blocks() {
            let (index, block) = block?;
            let feed = assembler.feed(index, &block);
            feed.log_faults(index);

            for scanned in feed.completed {
                if !matches!(self.classify(&scanned), ChainOutcome::OrphanTail) {
                    chains.push(scanned.chain);
                }
            }
        }
        if let Some(chain) = assembler.finish() {
            chain.log();
        }

        Ok(chains)
    }

    /// Place one encoded record, splitting it as needed
    fn place(&self, mut acc: BlockAccumulator, payload: &[u8]) -> Result<BlockAccumulator> {
        if acc.free() <= CHUNK_HEADER_SIZE {
            acc.flush();
        }

        let mut remaining = payload;
        let mut is_head = true;

        loop {
            let capacity = acc.free() - CHUNK_HEADER_SIZE;

            if remaining.len() <= capacity {
                acc.append(&encode_chunk(false, remaining), is_head)?;
                return Ok(acc);
            }

            let (head, tail) = remaining.split_at(capacity);
            acc.append(&encode_chunk(true, head), is_head)?;
            acc.flush();

            remaining = tail;
            is_head = false;
        }
    }

    /// Decode a reassembled payload, which must hold exactly one record
    fn decode_chain(&self, chain: &AssembledChain) -> Result<Record> {
        let record = self.codec.decode(&chain.payload)?;
        let frame_len = self.codec.frame_len(&chain.payload)?;

        if frame_len != chain.payload.len() {
            return Err(BlockError::Decode(format!(
                "chain starting in block {} carries {} bytes after its record",
                chain.first_block,
                chain.payload.len() - frame_len
            )));
        }
        Ok(record)
    }

    /// A chain that starts right after damage and does not decode is the
    /// rest of the damaged record, not a record of its own
    fn classify(&self, scanned: &ScannedChain) -> ChainOutcome {
        match self.decode_chain(&scanned.chain) {
            Ok(record) => ChainOutcome::Record(record),
            Err(_) if scanned.after_damage => ChainOutcome::OrphanTail,
            Err(e) => ChainOutcome::Corrupt(e),
        }
    }

    fn exclude_spans(&self, usages: &mut [BlockUsage], spans: &[(usize, usize)]) {
        if self.dangling == DanglingChunkPolicy::Strict {
            for &(block, bytes) in spans {
                usages[block].bytes_used -= bytes;
            }
        }
    }
}

impl StorageStrategy for FragmentedStorage {
    fn layout(&self) -> Layout {
        Layout::Fragmented
    }

    fn block_size(&self) -> usize {
        self.store.block_size()
    }

    fn write_all(&self, path: &Path, records: &[Record]) -> Result<StorageStats> {
        let packed = records
            .iter()
            .try_fold(BlockAccumulator::new(self.block_size()), |acc, record| {
                let encoded = self.codec.encode(record)?;
                self.place(acc, &encoded)
            })?
            .finish();

        self.store.create_and_write_all(path, &packed.blocks)?;

        tracing::info!(
            "Wrote {} fragmented records into {} blocks ({:.2}% efficiency)",
            records.len(),
            packed.stats.total_blocks,
            packed.stats.efficiency
        );

        Ok(packed.stats)
    }

    fn read_all(&self, path: &Path) -> Result<Vec<Record>> {
        let mut reader = self.store.open(path)?;
        let mut assembler = ChainAssembler::default();
        let mut records = Vec::new();

        for block in reader.blocks() {
            let (index, block) = block?;
            let feed = assembler.feed(index, &block);
            feed.log_faults(index);

            for scanned in &feed.completed {
                match self.classify(scanned) {
                    ChainOutcome::Record(record) => records.push(record),
                    ChainOutcome::OrphanTail => scanned.log_orphan(),
                    ChainOutcome::Corrupt(e) => tracing::warn!(
                        "Skipping record starting in block {}: {}",
                        scanned.chain.first_block,
                        e
                    ),
                }
            }
        }
        if let Some(chain) = assembler.finish() {
            chain.log();
        }

        Ok(records)
    }

    fn find_by_key(&self, path: &Path, key: u32) -> Result<Record> {
        let mut reader = self.store.open(path)?;
        let mut assembler = ChainAssembler::default();

        for block in reader.blocks() {
            let (index, block) = block?;
            let feed = assembler.feed(index, &block);

            // The key is only readable once the whole chain is assembled
            for ScannedChain { chain, .. } in &feed.completed {
                if peek_key(&chain.payload) == Some(key) {
                    tracing::debug!(
                        "Key {} found in chain at block {} spanning {} blocks",
                        key,
                        chain.first_block,
                        chain.block_count
                    );
                    return self.decode_chain(chain);
                }
            }

            if let Some(chain) = feed.broken.into_iter().next() {
                return Err(BlockError::Decode(chain.reason));
            }
            if let Some(fault) = feed.fault {
                return Err(fault);
            }
        }

        if let Some(chain) = assembler.finish() {
            return Err(BlockError::Decode(chain.reason));
        }

        Err(BlockError::KeyNotFound(key))
    }

    fn stats(&self, path: &Path) -> Result<StorageStats> {
        let mut reader = self.store.open(path)?;
        let mut assembler = ChainAssembler::default();
        let mut collector = StatsCollector::new(self.block_size());
        let mut usages: Vec<BlockUsage> = Vec::new();
        let mut broken = Vec::new();

        for block in reader.blocks() {
            let (index, block) = block?;
            let feed = assembler.feed(index, &block);

            usages.push(BlockUsage {
                bytes_used: feed.bytes_used,
                record_count: 0,
            });

            for scanned in &feed.completed {
                match self.classify(scanned) {
                    ChainOutcome::Record(_) => usages[scanned.chain.first_block].record_count += 1,
                    ChainOutcome::OrphanTail => {
                        scanned.log_orphan();
                        self.exclude_spans(&mut usages, &scanned.spans);
                    }
                    ChainOutcome::Corrupt(e) => {
                        tracing::warn!(
                            "Corrupt record starting in block {}: {}",
                            scanned.chain.first_block,
                            e
                        );
                        collector.note_corrupt();
                    }
                }
            }

            // A fault that broke a pending chain is counted with that chain
            if let Some(fault) = &feed.fault {
                tracing::warn!("Unreadable chunk in block {}: {}", index, fault);
                if feed.broken.is_empty() {
                    collector.note_corrupt();
                }
            }
            broken.extend(feed.broken);
        }
        broken.extend(assembler.finish());

        for chain in &broken {
            chain.log();
            if !chain.after_damage {
                collector.note_corrupt();
            }
            self.exclude_spans(&mut usages, &chain.spans);
        }

        for usage in usages {
            collector.push(usage);
        }

        Ok(collector.finish())
    }
}

// =============================================================================
// Chain reassembly
// =============================================================================

/// A record payload reassembled from its chunk chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledChain {
    /// Block holding the chain's first chunk
    pub first_block: usize,
    /// Number of blocks the chain touches
    pub block_count: usize,
    pub payload: Vec<u8>,
}

/// A complete chain as the scanner saw it
#[derive(Debug)]
struct ScannedChain {
    chain: AssembledChain,
    /// `(block, chunk bytes)` for every chunk of the chain
    spans: Vec<(usize, usize)>,
    /// Starts at offset 0 of the first block read after damage, so it may be
    /// the remainder of the damaged record
    after_damage: bool,
}

impl ScannedChain {
    fn log_orphan(&self) {
        tracing::warn!(
            "Skipping {} bytes in block {} left over from a damaged record",
            self.chain.payload.len(),
            self.chain.first_block
        );
    }
}

enum ChainOutcome {
    Record(Record),
    OrphanTail,
    Corrupt(BlockError),
}

/// A chain that never reached its terminal chunk
#[derive(Debug)]
struct BrokenChain {
    /// `(block, chunk bytes)` for every chunk the chain did have
    spans: Vec<(usize, usize)>,
    reason: String,
    /// Part of damage that has already been counted
    after_damage: bool,
}

impl BrokenChain {
    fn log(&self) {
        tracing::warn!("Skipping incomplete fragmented record: {}", self.reason);
    }
}

#[derive(Debug)]
struct PendingChain {
    first_block: usize,
    payload: Vec<u8>,
    spans: Vec<(usize, usize)>,
    after_damage: bool,
}

impl PendingChain {
    fn new(first_block: usize, after_damage: bool) -> Self {
        Self {
            first_block,
            payload: Vec::new(),
            spans: Vec::new(),
            after_damage,
        }
    }

    fn extend(&mut self, block: usize, chunk: &Chunk<'_>) {
        self.payload.extend_from_slice(chunk.payload);
        self.spans.push((block, chunk.encoded_len()));
    }

    fn complete(self) -> ScannedChain {
        ScannedChain {
            chain: AssembledChain {
                first_block: self.first_block,
                block_count: self.spans.len(),
                payload: self.payload,
            },
            spans: self.spans,
            after_damage: self.after_damage,
        }
    }

    fn broken(self, reason: String) -> BrokenChain {
        BrokenChain {
            spans: self.spans,
            reason: format!(
                "record starting in block {} is incomplete: {}",
                self.first_block, reason
            ),
            after_damage: self.after_damage,
        }
    }
}

/// What one block contributed to the scan
#[derive(Debug, Default)]
struct BlockFeed {
    /// Header and payload bytes of every well-formed chunk
    bytes_used: usize,
    completed: Vec<ScannedChain>,
    broken: Vec<BrokenChain>,
    /// Framing error that cut the block short
    fault: Option<BlockError>,
}

impl BlockFeed {
    fn log_faults(&self, index: usize) {
        for chain in &self.broken {
            chain.log();
        }
        if let Some(fault) = &self.fault {
            tracing::warn!("Unreadable chunk in block {}: {}", index, fault);
        }
    }
}

/// Follows continuation flags from block to block
#[derive(Debug, Default)]
struct ChainAssembler {
    pending: Option<PendingChain>,
    /// Set by a framing fault or a broken chain and cleared by the next
    /// readable chunk, which may be the tail of whatever was lost
    after_damage: bool,
}

impl ChainAssembler {
    /// Consume the next block in file order
    fn feed(&mut self, index: usize, block: &[u8]) -> BlockFeed {
        let mut feed = BlockFeed::default();
        let inherited = self.pending.is_some();
        let mut saw_chunk = false;

        for chunk in ChunkIter::new(block) {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    if let Some(chain) = self.pending.take() {
                        feed.broken.push(chain.broken(format!("block {}: {}", index, e)));
                    }
                    feed.fault = Some(e);
                    self.after_damage = true;
                    break;
                }
            };
            saw_chunk = true;
            feed.bytes_used += chunk.encoded_len();

            let mut chain = match self.pending.take() {
                Some(chain) => chain,
                None => PendingChain::new(index, std::mem::take(&mut self.after_damage)),
            };
            chain.extend(index, &chunk);

            if chunk.continues {
                self.pending = Some(chain);
            } else {
                feed.completed.push(chain.complete());
            }
        }

        if inherited && !saw_chunk {
            if let Some(chain) = self.pending.take() {
                feed.broken.push(chain.broken(format!(
                    "block {} does not start with its continuation",
                    index
                )));
                self.after_damage = true;
            }
        }

        feed
    }

    /// End of file: a chain still waiting for its continuation is dangling
    fn finish(self) -> Option<BrokenChain> {
        self.pending
            .map(|chain| chain.broken("the file ends before its last chunk".to_string()))
    }
}
