//! Segment chain
//!
//! Owns every segment of a store, in order. Segments are appended on demand
//! when a write reaches a higher segment index and are only released as a
//! whole by [`SegmentChain::clear`]. Segments live in a `Vec`, so lookups by
//! index are O(1).

use crate::address::{Geometry, Position};
use crate::block::Block;
use crate::error::{Result, ScullError};
use crate::segment::Segment;

#[derive(Debug, Default)]
pub struct SegmentChain {
    segments: Vec<Segment>,

    /// Blocks currently allocated across all segments
    allocated_blocks: usize,

    max_segments: Option<usize>,
    max_blocks: Option<usize>,
}

impl SegmentChain {
    /// Create an empty chain with optional allocation budgets
    pub fn new(max_segments: Option<usize>, max_blocks: Option<usize>) -> Self {
        SegmentChain {
            segments: Vec::new(),
            allocated_blocks: 0,
            max_segments,
            max_blocks,
        }
    }

    /// Number of segments in the chain
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of allocated blocks across the chain
    pub fn allocated_blocks(&self) -> usize {
        self.allocated_blocks
    }

    /// Replace the allocation budgets. Existing segments and blocks are kept
    /// even if they exceed the new limits.
    pub fn set_limits(&mut self, max_segments: Option<usize>, max_blocks: Option<usize>) {
        self.max_segments = max_segments;
        self.max_blocks = max_blocks;
    }

    /// Find segment `index` without allocating.
    ///
    /// `None` means the chain is too short, i.e. the whole segment is a hole.
    pub fn locate(&self, index: u64) -> Option<&Segment> {
        let index = usize::try_from(index).ok()?;
        self.segments.get(index)
    }

    /// Find segment `index`, appending empty segments until it exists.
    ///
    /// On failure the segments appended so far stay in the chain.
    pub fn locate_or_create(&mut self, index: u64) -> Result<&mut Segment> {
        let index = self.grow_to(index)?;
        Ok(&mut self.segments[index])
    }

    fn grow_to(&mut self, index: u64) -> Result<usize> {
        let index = usize::try_from(index).map_err(|_| ScullError::AllocationFailure {
            what: "segment index",
        })?;

        let wanted = index.checked_add(1).ok_or(ScullError::AllocationFailure {
            what: "segment index",
        })?;
        if self.segments.len() >= wanted {
            return Ok(index);
        }

        // Never grow past the budget; what fits under it is still appended
        let reachable = match self.max_segments {
            Some(limit) => wanted.min(limit.max(self.segments.len())),
            None => wanted,
        };

        if self
            .segments
            .try_reserve(reachable - self.segments.len())
            .is_err()
        {
            tracing::warn!(
                "Segment allocation failed growing chain from {} to {} segments",
                self.segments.len(),
                reachable
            );
            return Err(ScullError::AllocationFailure { what: "segment" });
        }
        self.segments.resize_with(reachable, Segment::new);

        if reachable < wanted {
            let limit = self.max_segments.unwrap_or(reachable);
            tracing::warn!(
                "Segment budget exhausted at {} segments (wanted index {})",
                limit,
                index
            );
            return Err(ScullError::BudgetExhausted {
                what: "segment",
                limit,
            });
        }

        Ok(index)
    }

    /// Find the block holding `pos` without allocating
    pub fn block(&self, pos: &Position) -> Option<&Block> {
        self.locate(pos.segment)?.block(pos.block)
    }

    /// Find the block holding `pos`, materialising the segment, its block
    /// array and the block itself as needed.
    pub fn block_or_create(&mut self, pos: &Position, geometry: &Geometry) -> Result<&mut Block> {
        let index = self.grow_to(pos.segment)?;
        let slots = self.segments[index].ensure_blocks(geometry.qset())?;

        let slot = &mut slots[pos.block];
        if slot.is_none() {
            if let Some(limit) = self.max_blocks {
                if self.allocated_blocks >= limit {
                    tracing::warn!("Block budget exhausted at {} blocks", limit);
                    return Err(ScullError::BudgetExhausted {
                        what: "block",
                        limit,
                    });
                }
            }

            let block = Block::new(geometry.quantum()).map_err(|e| {
                tracing::warn!("Block allocation failed: {}", e);
                e
            })?;
            self.allocated_blocks += 1;
            tracing::trace!(
                "Allocated block {} of segment {} ({} blocks total)",
                pos.block,
                pos.segment,
                self.allocated_blocks
            );
            *slot = Some(block);
        }

        slot.as_mut().ok_or(ScullError::AllocationFailure { what: "block" })
    }

    /// Release every block and segment, leaving the chain empty.
    ///
    /// Returns the number of blocks released.
    pub fn clear(&mut self) -> usize {
        let mut released = 0;
        for segment in self.segments.iter_mut() {
            released += segment.release();
        }
        self.segments.clear();
        self.segments.shrink_to_fit();
        self.allocated_blocks = 0;
        released
    }
}
