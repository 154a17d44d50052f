//! Offset translation
//!
//! Maps a logical byte offset onto `(segment, block, byte)` coordinates.
//! Read and write paths both go through [`Geometry::locate`] so they always
//! agree on where a byte lives.

use crate::config::StoreConfig;

/// Coordinates of a single byte inside the segment chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Index of the segment in the chain
    pub segment: u64,
    /// Index of the block within that segment
    pub block: usize,
    /// Byte offset within that block
    pub byte: usize,
}

/// Block and segment dimensions of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    quantum: usize,
    qset: usize,
}

impl Geometry {
    /// Build a geometry from a config that has already passed `check()`
    pub(crate) fn from_config(config: &StoreConfig) -> Self {
        Geometry {
            quantum: config.quantum,
            qset: config.qset,
        }
    }

    /// Bytes per block
    pub fn quantum(&self) -> usize {
        self.quantum
    }

    /// Blocks per segment
    pub fn qset(&self) -> usize {
        self.qset
    }

    /// Bytes addressed by one segment
    pub fn itemsize(&self) -> u64 {
        self.quantum as u64 * self.qset as u64
    }

    /// Translate a logical offset
    pub fn locate(&self, offset: u64) -> Position {
        let itemsize = self.itemsize();
        let quantum = self.quantum as u64;

        let rest = offset % itemsize;
        Position {
            segment: offset / itemsize,
            block: (rest / quantum) as usize,
            byte: (rest % quantum) as usize,
        }
    }

    /// Bytes left in the block that contains `pos`
    pub fn remaining_in_block(&self, pos: &Position) -> usize {
        self.quantum - pos.byte
    }
}
