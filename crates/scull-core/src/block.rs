//! Fixed-size data blocks
//!
//! A block is `quantum` bytes of zero-initialised storage plus a bitmap of
//! which bytes have ever been written. Bytes that were never written read as
//! a hole even though the block itself is allocated.

use crate::error::{Result, ScullError};

/// Bitmap of written bytes (one bit per byte, 64 bytes per word)
#[derive(Debug)]
struct WrittenMap {
    words: Vec<u64>,
}

impl WrittenMap {
    fn with_len(len: usize) -> Result<Self> {
        let num_words = (len + 63) / 64;
        let mut words = Vec::new();
        words
            .try_reserve_exact(num_words)
            .map_err(|_| ScullError::AllocationFailure {
                what: "block bitmap",
            })?;
        words.resize(num_words, 0u64);
        Ok(WrittenMap { words })
    }

    fn is_set(&self, pos: usize) -> bool {
        (self.words[pos / 64] & (1u64 << (pos % 64))) != 0
    }

    fn set_range(&mut self, start: usize, end: usize) {
        let mut pos = start;
        while pos < end {
            let bit_idx = pos % 64;
            if bit_idx == 0 && pos + 64 <= end {
                self.words[pos / 64] = u64::MAX;
                pos += 64;
            } else {
                self.words[pos / 64] |= 1u64 << bit_idx;
                pos += 1;
            }
        }
    }

    /// Length of the run of set bits starting at `start`, capped at `end`
    fn run_len(&self, start: usize, end: usize) -> usize {
        let mut pos = start;
        while pos < end {
            let word = self.words[pos / 64];
            if pos % 64 == 0 && word == u64::MAX && pos + 64 <= end {
                pos += 64;
                continue;
            }
            if (word & (1u64 << (pos % 64))) == 0 {
                break;
            }
            pos += 1;
        }
        pos - start
    }

    fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

/// One `quantum`-sized unit of storage
#[derive(Debug)]
pub struct Block {
    data: Box<[u8]>,
    written: WrittenMap,
}

impl Block {
    /// Allocate a zeroed block, reporting allocator refusal as an error
    pub fn new(quantum: usize) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(quantum)
            .map_err(|_| ScullError::AllocationFailure { what: "block" })?;
        data.resize(quantum, 0u8);

        Ok(Block {
            data: data.into_boxed_slice(),
            written: WrittenMap::with_len(quantum)?,
        })
    }

    /// Block size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The contiguous written bytes starting at `start`, at most `max` long.
    ///
    /// Empty when `start` itself was never written.
    pub fn written_from(&self, start: usize, max: usize) -> &[u8] {
        if start >= self.data.len() || !self.written.is_set(start) {
            return &[];
        }
        let end = start.saturating_add(max).min(self.data.len());
        let run = self.written.run_len(start, end);
        &self.data[start..start + run]
    }

    /// Writable window of `len` bytes at `start`. Bytes are not marked as
    /// written until [`Block::commit`] is called for them.
    pub fn window_mut(&mut self, start: usize, len: usize) -> &mut [u8] {
        &mut self.data[start..start + len]
    }

    /// Mark `start..start + len` as holding data
    pub fn commit(&mut self, start: usize, len: usize) {
        self.written.set_range(start, start + len);
    }

    /// Number of bytes that have been written at least once
    pub fn written_bytes(&self) -> usize {
        self.written.count()
    }
}
