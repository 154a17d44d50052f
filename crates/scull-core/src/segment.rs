//! Segments (quantum sets)
//!
//! A segment owns a lazily allocated array of `qset` block slots. The array
//! appears on the first write that lands in the segment; each slot stays a
//! hole until a write touches it.

use crate::block::Block;
use crate::error::{Result, ScullError};

#[derive(Debug, Default)]
pub struct Segment {
    blocks: Option<Vec<Option<Block>>>,
}

impl Segment {
    /// A segment with no block array
    pub fn new() -> Self {
        Segment { blocks: None }
    }

    /// Whether the block array has been allocated
    pub fn has_blocks(&self) -> bool {
        self.blocks.is_some()
    }

    /// Look up a block without allocating. `None` for an absent array or an
    /// empty slot.
    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.as_ref()?.get(index)?.as_ref()
    }

    /// Allocate the block array if it does not exist yet
    pub fn ensure_blocks(&mut self, qset: usize) -> Result<&mut Vec<Option<Block>>> {
        if self.blocks.is_none() {
            let mut slots = Vec::new();
            slots
                .try_reserve_exact(qset)
                .map_err(|_| ScullError::AllocationFailure {
                    what: "block array",
                })?;
            slots.resize_with(qset, || None);
            self.blocks = Some(slots);
        }

        Ok(self.blocks.get_or_insert_with(Vec::new))
    }

    /// Number of allocated blocks in this segment
    pub fn allocated_blocks(&self) -> usize {
        self.blocks
            .as_ref()
            .map(|slots| slots.iter().filter(|slot| slot.is_some()).count())
            .unwrap_or(0)
    }

    /// Release every block and the block array. Returns the number of
    /// blocks released.
    pub fn release(&mut self) -> usize {
        let mut released = 0;
        if let Some(mut slots) = self.blocks.take() {
            for slot in slots.iter_mut() {
                if slot.take().is_some() {
                    released += 1;
                }
            }
        }
        released
    }
}
