//! Storage engine
//!
//! [`ScullStore`] ties the segment chain and offset translation together
//! into `read`, `write` and `trim`, and tracks the logical size.
//!
//! A single call never crosses a block boundary: reads and writes are
//! clamped to the end of the block that holds `offset`, and callers loop at
//! the advanced offset to move more data.

use crate::address::Geometry;
use crate::chain::SegmentChain;
use crate::config::StoreConfig;
use crate::copy;
use crate::error::{Result, ScullError};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tracing::{debug, info, trace};

/// Snapshot of store occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScullStats {
    /// Logical size in bytes
    pub size: u64,
    /// Bytes per block
    pub quantum: usize,
    /// Blocks per segment
    pub qset: usize,
    /// Segments in the chain
    pub segments: usize,
    /// Blocks currently allocated
    pub allocated_blocks: usize,
    /// Bytes held by allocated blocks
    pub allocated_bytes: u64,
}

impl ScullStats {
    /// Render as JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Sparse byte store backed by a chain of lazily allocated segments
#[derive(Debug)]
pub struct ScullStore {
    /// Configuration applied by the next `trim()`
    config: StoreConfig,

    /// Layout of the data currently in the chain
    geometry: Geometry,

    chain: SegmentChain,

    /// Logical size in bytes
    size: u64,
}

impl Default for ScullStore {
    fn default() -> Self {
        let config = StoreConfig::default();
        ScullStore {
            geometry: Geometry::from_config(&config),
            chain: SegmentChain::new(config.max_segments, config.max_blocks),
            config,
            size: 0,
        }
    }
}

impl ScullStore {
    /// Create an empty store
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.check()?;
        info!(
            "Creating store with quantum={} qset={}",
            config.quantum, config.qset
        );

        Ok(ScullStore {
            geometry: Geometry::from_config(&config),
            chain: SegmentChain::new(config.max_segments, config.max_blocks),
            config,
            size: 0,
        })
    }

    /// Logical size in bytes
    pub fn current_size(&self) -> u64 {
        self.size
    }

    /// Blocks per segment of the current layout
    pub fn current_qset(&self) -> usize {
        self.geometry.qset()
    }

    /// Bytes per block of the current layout
    pub fn current_quantum(&self) -> usize {
        self.geometry.quantum()
    }

    /// Layout of the data currently stored
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Configuration the next `trim()` will apply
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Overwrite the logical size without touching storage.
    ///
    /// Growing the size exposes nothing new: bytes that were never written
    /// still read as holes. Shrinking it hides data without releasing it.
    pub fn set_size(&mut self, size: u64) {
        info!("Logical size set {} -> {}", self.size, size);
        self.size = size;
    }

    /// Record a new configuration. It takes effect at the next `trim()`.
    pub fn reconfigure(&mut self, config: StoreConfig) -> Result<()> {
        config.check()?;
        debug!(
            "Pending configuration quantum={} qset={}",
            config.quantum, config.qset
        );
        self.config = config;
        Ok(())
    }

    /// Read into `buf` starting at `offset`.
    ///
    /// Returns the number of bytes copied; `0` means end of data or a hole.
    pub fn read(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let len = buf.len();
        let mut dst = buf;
        self.read_to(offset, len, &mut dst)
    }

    /// Copy up to `len` bytes starting at `offset` into `dst`
    pub fn read_to<W: Write + ?Sized>(
        &self,
        offset: u64,
        len: usize,
        dst: &mut W,
    ) -> Result<usize> {
        if offset >= self.size {
            return Ok(0);
        }
        let available = self.size - offset;
        let len = if len as u64 > available {
            available as usize
        } else {
            len
        };

        let pos = self.geometry.locate(offset);
        let block = match self.chain.block(&pos) {
            Some(block) => block,
            None => {
                trace!("Read at {} hit an unallocated block", offset);
                return Ok(0);
            }
        };

        let len = len.min(self.geometry.remaining_in_block(&pos));
        let data = block.written_from(pos.byte, len);
        if data.is_empty() {
            trace!("Read at {} hit unwritten bytes", offset);
            return Ok(0);
        }

        copy::copy_out(data, dst)?;
        trace!("Read {} bytes at {}", data.len(), offset);
        Ok(data.len())
    }

    /// Write `data` at `offset`.
    ///
    /// Returns the number of bytes stored, which is short when `data` runs
    /// past the end of a block.
    pub fn write(&mut self, offset: u64, data: &[u8]) -> Result<usize> {
        let mut src = data;
        self.write_from(offset, data.len(), &mut src)
    }

    /// Copy up to `len` bytes from `src` into the store at `offset`.
    ///
    /// Segments and blocks allocated before a failure are kept.
    pub fn write_from<R: Read + ?Sized>(
        &mut self,
        offset: u64,
        len: usize,
        src: &mut R,
    ) -> Result<usize> {
        let pos = self.geometry.locate(offset);
        let room = u64::MAX - offset;
        let len = len.min(self.geometry.remaining_in_block(&pos));
        let len = if len as u64 > room { room as usize } else { len };
        if len == 0 {
            return Ok(0);
        }

        let block = self.chain.block_or_create(&pos, &self.geometry)?;

        if let Err(err) = copy::copy_in(src, block.window_mut(pos.byte, len)) {
            // Bytes that did arrive stay in the block; the size does not move
            if let ScullError::CopyFault { copied, .. } = &err {
                block.commit(pos.byte, *copied);
            }
            return Err(err);
        }
        block.commit(pos.byte, len);

        let end = offset + len as u64;
        if end > self.size {
            self.size = end;
        }

        trace!("Wrote {} bytes at {}", len, offset);
        Ok(len)
    }

    /// Write all of `data` at `offset`, one block at a time
    pub fn write_all(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let mut written = 0;
        while written < data.len() {
            let n = self.write(offset + written as u64, &data[written..])?;
            if n == 0 {
                return Err(ScullError::AllocationFailure {
                    what: "offset beyond addressable range",
                });
            }
            written += n;
        }
        Ok(())
    }

    /// Release all storage, reset the size to zero and apply the pending
    /// configuration. Never fails; trimming an empty store only resets state.
    pub fn trim(&mut self) {
        let segments = self.chain.len();
        let released = self.chain.clear();

        self.size = 0;
        self.geometry = Geometry::from_config(&self.config);
        self.chain
            .set_limits(self.config.max_segments, self.config.max_blocks);

        debug!(
            "Trimmed store: released {} blocks in {} segments (quantum={} qset={})",
            released,
            segments,
            self.geometry.quantum(),
            self.geometry.qset()
        );
    }

    /// Occupancy snapshot
    pub fn stats(&self) -> ScullStats {
        let allocated_blocks = self.chain.allocated_blocks();
        ScullStats {
            size: self.size,
            quantum: self.geometry.quantum(),
            qset: self.geometry.qset(),
            segments: self.chain.len(),
            allocated_blocks,
            allocated_bytes: allocated_blocks as u64 * self.geometry.quantum() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn store(quantum: usize, qset: usize) -> ScullStore {
        ScullStore::new(StoreConfig::new(quantum, qset)).unwrap()
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = ScullStore::default();
        assert_eq!(store.current_size(), 0);
        assert_eq!(store.current_quantum(), 4000);
        assert_eq!(store.current_qset(), 1);

        let mut buf = [0u8; 16];
        assert_eq!(store.read(0, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = ScullStore::new(StoreConfig::new(0, 1));
        assert!(matches!(result, Err(ScullError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_write_then_read() {
        let mut store = store(4000, 1);
        assert_eq!(store.write(0, b"0123456789").unwrap(), 10);
        assert_eq!(store.current_size(), 10);

        let mut buf = [0u8; 10];
        assert_eq!(store.read(0, &mut buf).unwrap(), 10);
        assert_eq!(&buf, b"0123456789");

        let mut buf = [0u8; 4];
        assert_eq!(store.read(6, &mut buf).unwrap(), 4);
        assert_eq!(&buf, b"6789");
    }

    #[test]
    fn test_read_clamped_to_size() {
        let mut store = store(4000, 1);
        store.write(0, b"abc").unwrap();

        let mut buf = [0xffu8; 10];
        assert_eq!(store.read(1, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"bc");
        assert_eq!(buf[2], 0xff);

        assert_eq!(store.read(3, &mut buf).unwrap(), 0);
        assert_eq!(store.read(1_000_000, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_write_clamped_to_block() {
        let mut store = store(8, 2);
        assert_eq!(store.write(5, b"abcdefgh").unwrap(), 3);
        assert_eq!(store.current_size(), 8);

        store.write_all(8, b"defgh").unwrap();
        assert_eq!(store.current_size(), 13);

        // Reads stop at the block boundary as well
        let mut buf = [0u8; 8];
        assert_eq!(store.read(5, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
        assert_eq!(store.read(8, &mut buf).unwrap(), 5);
        assert_eq!(&buf[..5], b"defgh");
    }

    #[test]
    fn test_write_all_across_segments() {
        let mut store = store(4, 2);
        let data: Vec<u8> = (0..50).collect();
        store.write_all(3, &data).unwrap();
        assert_eq!(store.current_size(), 53);

        let mut out = Vec::new();
        let mut offset = 3;
        loop {
            let mut buf = [0u8; 16];
            let n = store.read(offset, &mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
            offset += n as u64;
        }
        assert_eq!(out, data);
    }

    #[test]
    fn test_holes_read_as_end_of_data() {
        let mut store = store(4000, 1);
        store.write(0, &[1u8; 10]).unwrap();
        store.write(8000, &[2u8; 10]).unwrap();
        assert_eq!(store.current_size(), 8010);

        let mut buf = vec![0u8; 4000];
        // Unwritten tail of an allocated block
        assert_eq!(store.read(10, &mut buf).unwrap(), 0);
        // Unallocated block in an existing segment chain
        assert_eq!(store.read(4000, &mut buf).unwrap(), 0);
        assert_eq!(store.read(8000, &mut buf).unwrap(), 10);
    }

    #[test]
    fn test_hole_before_write_in_same_block() {
        let mut store = store(100, 1);
        store.write(50, b"xyz").unwrap();

        let mut buf = [0u8; 100];
        assert_eq!(store.read(0, &mut buf).unwrap(), 0);
        assert_eq!(store.read(49, &mut buf).unwrap(), 0);
        assert_eq!(store.read(50, &mut buf).unwrap(), 3);
    }

    #[test]
    fn test_overwrite() {
        let mut store = store(16, 1);
        store.write(0, b"aaaaaaaa").unwrap();
        store.write(2, b"bb").unwrap();
        assert_eq!(store.current_size(), 8);

        let mut buf = [0u8; 8];
        store.read(0, &mut buf).unwrap();
        assert_eq!(&buf, b"aabbaaaa");
    }

    #[test]
    fn test_trim() {
        let mut store = store(16, 2);
        store.write_all(0, &[7u8; 100]).unwrap();
        assert!(store.stats().allocated_blocks > 0);

        store.trim();
        assert_eq!(store.current_size(), 0);
        let stats = store.stats();
        assert_eq!(stats.segments, 0);
        assert_eq!(stats.allocated_blocks, 0);

        let mut buf = [0u8; 4];
        assert_eq!(store.read(0, &mut buf).unwrap(), 0);

        // Idempotent
        store.trim();
        assert_eq!(store.stats(), stats);
    }

    #[test]
    fn test_reconfigure_applies_on_trim() {
        let mut store = store(16, 2);
        store.write(0, b"data").unwrap();

        store.reconfigure(StoreConfig::new(32, 4)).unwrap();
        assert_eq!(store.current_quantum(), 16);
        assert_eq!(store.current_qset(), 2);

        let mut buf = [0u8; 4];
        assert_eq!(store.read(0, &mut buf).unwrap(), 4);

        store.trim();
        assert_eq!(store.current_quantum(), 32);
        assert_eq!(store.current_qset(), 4);
    }

    #[test]
    fn test_reconfigure_rejects_invalid() {
        let mut store = store(16, 2);
        let result = store.reconfigure(StoreConfig::new(16, 0));
        assert!(matches!(result, Err(ScullError::InvalidConfiguration(_))));
        assert_eq!(store.config(), &StoreConfig::new(16, 2));
    }

    #[test]
    fn test_set_size() {
        let mut store = store(16, 1);
        store.write(0, b"abcdef").unwrap();

        store.set_size(3);
        let mut buf = [0u8; 8];
        assert_eq!(store.read(0, &mut buf).unwrap(), 3);
        assert_eq!(store.read(3, &mut buf).unwrap(), 0);

        // Growing the size does not invent data
        store.set_size(100);
        assert_eq!(store.read(0, &mut buf).unwrap(), 6);
        assert_eq!(store.read(6, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_block_budget_failure_keeps_size() {
        let mut store = ScullStore::new(StoreConfig::new(8, 1).max_blocks(1)).unwrap();
        store.write(0, b"ok").unwrap();

        let err = store.write(8, b"no").unwrap_err();
        assert!(err.is_allocation_failure());
        assert_eq!(store.current_size(), 2);
        // The segment was added before the block was refused
        assert_eq!(store.stats().segments, 2);
    }

    #[test]
    fn test_write_from_short_source() {
        let mut store = store(16, 1);
        let mut src: &[u8] = b"abc";
        let err = store.write_from(0, 8, &mut src).unwrap_err();
        assert!(matches!(err, ScullError::CopyFault { copied: 3, .. }));
        assert_eq!(store.current_size(), 0);
        // The block was allocated before the copy failed
        assert_eq!(store.stats().allocated_blocks, 1);
    }

    #[test]
    fn test_read_to_failing_sink() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "bad address"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut store = store(16, 1);
        store.write(0, b"abc").unwrap();
        let err = store.read_to(0, 3, &mut Broken).unwrap_err();
        assert!(matches!(err, ScullError::CopyFault { expected: 3, .. }));
    }

    #[test]
    fn test_write_at_end_of_address_space() {
        let mut store = store(4000, 1);
        assert_eq!(store.write(u64::MAX, b"x").unwrap(), 0);
        assert_eq!(store.current_size(), 0);
    }

    #[test]
    fn test_stats() {
        let mut store = store(100, 4);
        store.write(0, b"a").unwrap();
        store.write(450, b"b").unwrap();

        let stats = store.stats();
        assert_eq!(stats.size, 451);
        assert_eq!(stats.segments, 2);
        assert_eq!(stats.allocated_blocks, 2);
        assert_eq!(stats.allocated_bytes, 200);

        let json = stats.to_json().unwrap();
        assert!(json.contains("\"allocated_blocks\":2"));
    }
}
