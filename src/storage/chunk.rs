//! Chunk framing for the fragmented layout
//!
//! ## Chunk Format
//! ```text
//! ┌──────────┬──────────────┬─────────────────────┐
//! │ Flag (1) │ Length (4)   │ Payload (Length)    │
//! │ 0 / 1    │ u32 LE       │                     │
//! └──────────┴──────────────┴─────────────────────┘
//! ```
//! Flag 1 means the record continues at offset 0 of the next block; such a
//! chunk always runs to the end of its block. A header of all zeroes is
//! padding and ends the block's chunk list.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{BlockError, Result};

/// Flag (1) + length (4)
pub const CHUNK_HEADER_SIZE: usize = 5;

const FLAG_LAST: u8 = 0;
const FLAG_CONTINUES: u8 = 1;

/// One chunk as stored inside a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Offset of the chunk header within its block
    pub offset: usize,
    /// Continuation flag
    pub continues: bool,
    pub payload: &'a [u8],
}

impl Chunk<'_> {
    /// Header plus payload
    pub fn encoded_len(&self) -> usize {
        CHUNK_HEADER_SIZE + self.payload.len()
    }
}

/// Frame `payload` as a chunk
pub fn encode_chunk(continues: bool, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(CHUNK_HEADER_SIZE + payload.len());
    buf.put_u8(if continues { FLAG_CONTINUES } else { FLAG_LAST });
    buf.put_u32_le(payload.len() as u32);
    buf.put_slice(payload);
    buf.freeze()
}

/// Parses the chunks of one block in order
///
/// Ends at padding, when fewer than `CHUNK_HEADER_SIZE` bytes remain, after a
/// continuation chunk, or after yielding a framing error.
#[derive(Debug, Clone)]
pub struct ChunkIter<'a> {
    block: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> ChunkIter<'a> {
    pub fn new(block: &'a [u8]) -> Self {
        Self {
            block,
            offset: 0,
            done: false,
        }
    }

    fn fail(&mut self, message: String) -> Option<Result<Chunk<'a>>> {
        self.done = true;
        Some(Err(BlockError::Decode(message)))
    }
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = Result<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset + CHUNK_HEADER_SIZE > self.block.len() {
            return None;
        }

        let offset = self.offset;
        let mut header = &self.block[offset..offset + CHUNK_HEADER_SIZE];
        let flag = header.get_u8();
        let len = header.get_u32_le() as usize;

        if flag == FLAG_LAST && len == 0 {
            self.done = true;
            return None;
        }
        if flag != FLAG_LAST && flag != FLAG_CONTINUES {
            return self.fail(format!("chunk at offset {} has invalid flag {:#04x}", offset, flag));
        }

        let start = offset + CHUNK_HEADER_SIZE;
        let end = match start.checked_add(len) {
            Some(end) if end <= self.block.len() => end,
            _ => {
                return self.fail(format!(
                    "chunk at offset {} claims {} bytes but only {} remain in the block",
                    offset,
                    len,
                    self.block.len() - start
                ))
            }
        };

        let continues = flag == FLAG_CONTINUES;
        if continues && end != self.block.len() {
            return self.fail(format!(
                "continuation chunk at offset {} ends at {} instead of the block end",
                offset, end
            ));
        }

        self.offset = end;
        self.done = continues;

        Some(Ok(Chunk {
            offset,
            continues,
            payload: &self.block[start..end],
        }))
    }
}
