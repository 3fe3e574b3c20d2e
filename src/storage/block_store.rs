//! Block Store
//!
//! Block-granular file I/O. A file is a headerless sequence of equal-sized
//! blocks; block `n` starts at byte `n * block_size`. Only whole blocks are
//! ever written or read.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use bytes::Bytes;

use crate::error::{BlockError, Result};

/// Whole-block reads and writes for one block size
#[derive(Debug, Clone, Copy)]
pub struct BlockStore {
    block_size: usize,
}

impl BlockStore {
    pub fn new(block_size: usize) -> Self {
        Self { block_size }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Truncate-create `path` and write every block, zero-padded to the
    /// block size, in order
    pub fn create_and_write_all(&self, path: &Path, blocks: &[Bytes]) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::new(file);
        let padding = vec![0u8; self.block_size];

        for (index, block) in blocks.iter().enumerate() {
            if block.len() > self.block_size {
                return Err(BlockError::Config(format!(
                    "Block {} holds {} bytes but the block size is {}",
                    index,
                    block.len(),
                    self.block_size
                )));
            }
            writer.write_all(block)?;
            writer.write_all(&padding[..self.block_size - block.len()])?;
        }

        writer.flush()?;
        let file = writer.into_inner().map_err(|e| BlockError::Io(e.into_error()))?;
        file.sync_all()?;

        tracing::debug!(
            "Wrote {} blocks of {} bytes to {}",
            blocks.len(),
            self.block_size,
            path.display()
        );

        Ok(())
    }

    /// Read block `index` of `path`
    pub fn read_block(&self, path: &Path, index: usize) -> Result<Vec<u8>> {
        self.open(path)?.read_block(index)
    }

    /// Number of whole blocks in `path`
    pub fn block_count(&self, path: &Path) -> Result<usize> {
        Ok(self.open(path)?.block_count())
    }

    /// Open `path` for a scan; the handle is released when the reader drops
    pub fn open(&self, path: &Path) -> Result<BlockReader> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len() as usize;

        let block_count = file_len / self.block_size;
        let trailing = file_len % self.block_size;
        if trailing != 0 {
            tracing::warn!(
                "{} ends with {} bytes that do not form a whole block; ignoring them",
                path.display(),
                trailing
            );
        }

        Ok(BlockReader {
            file,
            block_size: self.block_size,
            block_count,
        })
    }
}

/// Open handle over one file, scoped to a single operation
#[derive(Debug)]
pub struct BlockReader {
    file: File,
    block_size: usize,
    block_count: usize,
}

impl BlockReader {
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Seek to `index * block_size` and read exactly one block
    pub fn read_block(&mut self, index: usize) -> Result<Vec<u8>> {
        if index >= self.block_count {
            return Err(BlockError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "block {} is past the end of the file ({} blocks)",
                    index, self.block_count
                ),
            )));
        }

        self.file
            .seek(SeekFrom::Start((index * self.block_size) as u64))?;
        let mut block = vec![0u8; self.block_size];
        self.file.read_exact(&mut block)?;
        Ok(block)
    }

    /// All blocks in file order as `(index, bytes)`
    pub fn blocks(&mut self) -> impl Iterator<Item = Result<(usize, Vec<u8>)>> + '_ {
        let count = self.block_count;
        (0..count).map(move |index| self.read_block(index).map(|block| (index, block)))
    }
}
