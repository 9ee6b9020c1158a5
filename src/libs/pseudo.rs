//! Processed pseudogene track: the query region of every chain classified as a processed
//! pseudogene copy of a gene, as BED9.

use crate::libs::bed::Bed;
use crate::libs::ortholog::parse_chain_ids;
use crate::libs::store::ChainSource;
use anyhow::Context;
use indexmap::IndexMap;
use std::io::BufRead;

pub const PINK_COLOR: &str = "250,50,200";
pub const DEF_SCORE: u32 = 100;

/// gene -> processed pseudogene chains, from column 5 of the chain classification table.
pub fn read_pp_chains<R: BufRead>(reader: R) -> anyhow::Result<IndexMap<String, Vec<u64>>> {
    let mut chains_of = IndexMap::new();
    for (i, line) in reader.lines().enumerate().skip(1) {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.trim_end().split('\t').collect();
        if fields.len() < 5 {
            return Err(anyhow::anyhow!(
                "Chain classification line {}: {} columns instead of 5",
                i + 1,
                fields.len()
            ));
        }
        let chains = parse_chain_ids(fields[4])
            .with_context(|| format!("Chain classification line {}", i + 1))?;
        if !chains.is_empty() {
            chains_of.insert(fields[0].to_string(), chains);
        }
    }
    Ok(chains_of)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PpRegion {
    pub name: String,
    pub chrom: String,
    pub strand: char,
    pub start: u64,
    pub end: u64,
}

impl std::fmt::Display for PpRegion {
    /// BED9, non-coding: thick start equals thick end.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.chrom,
            self.start,
            self.end,
            self.name,
            DEF_SCORE,
            self.strand,
            self.start,
            self.start,
            PINK_COLOR
        )
    }
}

/// Query regions of each `gene.chain` projection.
pub fn pp_regions<S: ChainSource>(
    chains_of: &IndexMap<String, Vec<u64>>,
    bed_of: &IndexMap<String, Bed>,
    chains: &S,
) -> anyhow::Result<Vec<PpRegion>> {
    let mut regions = vec![];
    for (gene, chain_ids) in chains_of {
        let bed = bed_of
            .get(gene)
            .ok_or_else(|| anyhow::anyhow!("Gene {} not found in annotation", gene))?;

        for chain_id in chain_ids {
            let header = chains.fetch(*chain_id)?.header;
            let (start, end) = header.q_plus_range();
            let strand = if header.q_strand == bed.strand { '+' } else { '-' };

            regions.push(PpRegion {
                name: format!("{}.{}", gene, chain_id),
                chrom: header.q_name.clone(),
                strand,
                start,
                end,
            });
        }
    }
    Ok(regions)
}
