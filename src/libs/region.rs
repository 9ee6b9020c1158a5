//! Query-side region sizes for every selected (gene, chain) pair.

use crate::libs::bed::Bed;
use crate::libs::convert::{ConvertError, CoordConverter, Interval};
use crate::libs::ortholog::Selection;
use crate::libs::skip::{SkipReason, Skipped};
use crate::libs::store::ChainSource;
use anyhow::Context;
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Relative length change tolerated for long-locus categories.
pub const REL_LENGTH_THR: f64 = 50.0;
/// Absolute length change (bp) tolerated for long-locus categories.
pub const ABS_LENGTH_THR: u64 = 500_000;

#[derive(Debug, Default)]
pub struct Regions {
    /// gene -> chain -> projected query length
    pub lengths: IndexMap<String, BTreeMap<u64, u64>>,
    pub skipped: Vec<Skipped>,
}

/// Sort chains numerically and split them at `limit`.
///
/// ```
/// # use exsplit::libs::region::truncate_chains;
/// let (kept, dropped) = truncate_chains(&[5, 1, 9], 2);
/// assert_eq!(kept, vec![1, 5]);
/// assert_eq!(dropped, vec![9]);
/// ```
pub fn truncate_chains(chains: &[u64], limit: usize) -> (Vec<u64>, Vec<u64>) {
    let mut sorted = chains.to_vec();
    sorted.sort_unstable();
    let dropped = sorted.split_off(limit.min(sorted.len()));
    (sorted, dropped)
}

/// True when a projection is too far from the source length to be plausible.
pub fn is_anomalous(tar_len: u64, que_len: u64) -> bool {
    let delta = tar_len.abs_diff(que_len);
    let ratio = delta as f64 / tar_len as f64;
    ratio > REL_LENGTH_THR || delta > ABS_LENGTH_THR
}

pub struct RegionProjector<'a, S, C> {
    bed_of: &'a IndexMap<String, Bed>,
    chains: &'a S,
    converter: &'a C,
    chains_limit: usize,
}

impl<'a, S: ChainSource, C: CoordConverter> RegionProjector<'a, S, C> {
    pub fn new(
        bed_of: &'a IndexMap<String, Bed>,
        chains: &'a S,
        converter: &'a C,
        chains_limit: usize,
    ) -> Self {
        Self {
            bed_of,
            chains,
            converter,
            chains_limit,
        }
    }

    /// Truncate, invert to chain -> genes, then run one converter call per chain.
    pub fn project(&self, selection: &Selection) -> anyhow::Result<Regions> {
        let mut regions = Regions::default();

        let mut genes_of: IndexMap<u64, Vec<&str>> = IndexMap::new();
        for (gene, chains) in &selection.genes {
            let ids: Vec<u64> = chains.keys().copied().collect();
            let (kept, dropped) = truncate_chains(&ids, self.chains_limit);
            if !dropped.is_empty() {
                regions.skipped.push(Skipped::new(
                    gene,
                    &dropped,
                    SkipReason::ChainLimitExceeded(self.chains_limit),
                ));
            }
            for chain in kept {
                genes_of.entry(chain).or_default().push(gene.as_str());
            }
        }

        let chains_num = genes_of.len();
        log::info!(
            "Precompute regions for {} genes over {} chains",
            selection.genes.len(),
            chains_num
        );

        for (i, (chain_id, genes)) in genes_of.iter().enumerate() {
            let chain = self.chains.fetch(*chain_id)?;

            let intervals = genes
                .iter()
                .map(|gene| {
                    self.bed_of
                        .get(*gene)
                        .map(|bed| Interval::new(&bed.chrom, bed.start, bed.end))
                        .ok_or_else(|| anyhow::anyhow!("Gene {} not found in annotation", gene))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;

            let projections = self
                .converter
                .project(&chain, &intervals)
                .and_then(|p| {
                    if p.len() == intervals.len() {
                        Ok(p)
                    } else {
                        Err(ConvertError::MissingRows {
                            id: *chain_id,
                            expected: intervals.len(),
                            got: p.len(),
                        })
                    }
                })
                .with_context(|| format!("projecting genes through chain {}", chain_id))?;

            for (gene, projection) in genes.iter().zip(projections) {
                let que_len = projection.query_len();
                let tar_len = projection.target_len();
                let long_locus = selection
                    .category(gene, *chain_id)
                    .is_some_and(|c| c.is_long_locus());

                if long_locus && is_anomalous(tar_len, que_len) {
                    regions.skipped.push(Skipped::new(
                        gene,
                        &[*chain_id],
                        SkipReason::AnomalousProjection,
                    ));
                    continue;
                }
                regions
                    .lengths
                    .entry(gene.to_string())
                    .or_default()
                    .insert(*chain_id, que_len);
            }

            log::debug!("Chain {} / {}", i + 1, chains_num);
        }

        Ok(regions)
    }
}
