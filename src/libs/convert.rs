//! Projection of target-genome intervals through a chain into query coordinates.
//!
//! Callers batch every interval that shares a chain into one [`CoordConverter::project`]
//! call, so block decoding happens once per chain.

use crate::libs::chain::{flip_if_minus, Block, Chain};

/// Target-side interval, 0-based half-open.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl Interval {
    pub fn new(chrom: &str, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.to_string(),
            start,
            end,
        }
    }
}

/// Result for one input interval. `q_start`/`q_end` are on the `+` strand of `q_name`.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub q_name: String,
    pub q_start: u64,
    pub q_end: u64,
    pub t_start: u64,
    pub t_end: u64,
}

impl Projection {
    pub fn query_len(&self) -> u64 {
        self.q_end - self.q_start
    }

    pub fn target_len(&self) -> u64 {
        self.t_end.saturating_sub(self.t_start)
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConvertError {
    #[error("chain {id} has no alignment blocks")]
    EmptyChain { id: u64 },
    #[error("interval on {interval} cannot be projected through chain {id} on {chain}")]
    ChromosomeMismatch {
        id: u64,
        chain: String,
        interval: String,
    },
    #[error("chain {id} returned {got} projections for {expected} intervals")]
    MissingRows { id: u64, expected: usize, got: usize },
}

pub trait CoordConverter {
    /// One [`Projection`] per input interval, in input order.
    fn project(
        &self,
        chain: &Chain,
        intervals: &[Interval],
    ) -> Result<Vec<Projection>, ConvertError>;
}

/// Native converter walking the chain's blocks.
///
/// Interval ends inside an aligned block map linearly; ends in a gap or beyond the chain
/// snap to the nearest block boundary toward the inside of the interval. The query span
/// is then widened to cover `flank_blocks` further blocks on each side.
#[derive(Debug, Clone)]
pub struct ChainConverter {
    flank_blocks: usize,
}

impl Default for ChainConverter {
    fn default() -> Self {
        Self { flank_blocks: 2 }
    }
}

impl ChainConverter {
    pub fn new(flank_blocks: usize) -> Self {
        Self { flank_blocks }
    }

    fn project_one(&self, chain: &Chain, blocks: &[Block], interval: &Interval) -> Projection {
        // first block ending after the start, last block starting before the end
        let first = blocks
            .partition_point(|b| b.t_end <= interval.start)
            .min(blocks.len() - 1);
        let last = blocks
            .partition_point(|b| b.t_start < interval.end)
            .saturating_sub(1);

        let q_from = map_position(&blocks[first], interval.start);
        let q_to = map_position(&blocks[last], interval.end);
        let (mut q_start, mut q_end) = (q_from.min(q_to), q_from.max(q_to));

        let (inner_lo, inner_hi) = (first.min(last), first.max(last));
        let lo = inner_lo.saturating_sub(self.flank_blocks);
        let hi = (inner_hi + self.flank_blocks).min(blocks.len() - 1);
        if lo < inner_lo {
            q_start = q_start.min(blocks[lo].q_start);
        }
        if hi > inner_hi {
            q_end = q_end.max(blocks[hi].q_end);
        }

        let (q_start, q_end) =
            flip_if_minus(chain.header.q_strand, chain.header.q_size, q_start, q_end);

        Projection {
            q_name: chain.header.q_name.clone(),
            q_start,
            q_end,
            t_start: interval.start,
            t_end: interval.end,
        }
    }
}

/// Query position of target position `pos`, clamped to the block.
fn map_position(block: &Block, pos: u64) -> u64 {
    let pos = pos.clamp(block.t_start, block.t_end);
    block.q_start + (pos - block.t_start)
}

impl CoordConverter for ChainConverter {
    fn project(
        &self,
        chain: &Chain,
        intervals: &[Interval],
    ) -> Result<Vec<Projection>, ConvertError> {
        let blocks = chain.to_blocks();
        if blocks.is_empty() {
            return Err(ConvertError::EmptyChain {
                id: chain.header.id,
            });
        }

        let mut projections = Vec::with_capacity(intervals.len());
        for interval in intervals {
            if interval.chrom != chain.header.t_name {
                return Err(ConvertError::ChromosomeMismatch {
                    id: chain.header.id,
                    chain: chain.header.t_name.clone(),
                    interval: interval.chrom.clone(),
                });
            }
            projections.push(self.project_one(chain, &blocks, interval));
        }

        Ok(projections)
    }
}
