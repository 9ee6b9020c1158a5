//! Static memory model of the CESAR realignment.
//!
//! The state count mirrors CESAR's per-exon layout:
//! `6 + 6 * num_codons + 1 + 2 + 2 + 22 + 6`, the last two terms being the acceptor and
//! donor states.

use crate::libs::bed::Bed;
use crate::libs::ortholog::Selection;
use crate::libs::region::Regions;
use crate::libs::skip::{SkipReason, Skipped};
use crate::libs::u12::IntronHints;
use indexmap::IndexMap;

/// Bytes added on top of the model.
pub const EXTRA_BYTES: u64 = 100_000;
/// Gigabytes added after rounding up.
pub const EXTRA_GIGS: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryEstimate {
    pub num_states: u64,
    pub ref_len: u64,
    pub bytes: u64,
    pub gigabytes: f64,
}

pub fn num_states(block_sizes: &[u64]) -> u64 {
    block_sizes
        .iter()
        .map(|size| 6 + 6 * (size / 3) + 1 + 2 + 2 + 22 + 6)
        .sum()
}

/// ```
/// # use exsplit::libs::memory::estimate;
/// let est = estimate(&[300, 150], 1000);
/// assert_eq!(est.bytes, 4_363_108);
/// assert_eq!(est.gigabytes, 1.25);
/// ```
pub fn estimate(block_sizes: &[u64], max_query_len: u64) -> MemoryEstimate {
    let states = num_states(block_sizes);
    let ref_len: u64 = block_sizes.iter().sum();
    let q = max_query_len;

    let bytes = states * 4 * 8
        + states * q * 4
        + states * 304
        + (2 * q + ref_len) * 8
        + (q + ref_len) * 2
        + EXTRA_BYTES;
    let gigabytes = bytes.div_ceil(1_000_000_000) as f64 + EXTRA_GIGS;

    MemoryEstimate {
        num_states: states,
        ref_len,
        bytes,
        gigabytes,
    }
}

/// Upper bound on a task's memory. A bucket ceiling is a whole number of gigabytes; a
/// `--mem-limit` value keeps its decimal point in the skip log, e.g. `40.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MemLimit {
    Gigabytes(f64),
    Ceiling(u64),
}

impl MemLimit {
    pub fn gigabytes(&self) -> f64 {
        match self {
            MemLimit::Gigabytes(v) => *v,
            MemLimit::Ceiling(c) => *c as f64,
        }
    }
}

impl std::fmt::Display for MemLimit {
    /// ```
    /// # use exsplit::libs::memory::MemLimit;
    /// assert_eq!(MemLimit::Gigabytes(40.0).to_string(), "40.0");
    /// assert_eq!(MemLimit::Gigabytes(2.5).to_string(), "2.5");
    /// assert_eq!(MemLimit::Ceiling(40).to_string(), "40");
    /// ```
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MemLimit::Gigabytes(v) => write!(f, "{:?}", v),
            MemLimit::Ceiling(c) => write!(f, "{}", c),
        }
    }
}

/// One gene's realignment job.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub gene: String,
    pub chains: Vec<u64>,
    pub memory: f64,
    pub u12: bool,
}

/// Turn projected regions into tasks, in selection order.
///
/// Genes whose chains were all rejected during projection produce nothing; genes over
/// `mem_limit` are skipped.
pub fn make_tasks(
    selection: &Selection,
    regions: &Regions,
    bed_of: &IndexMap<String, Bed>,
    hints: &IntronHints,
    mem_limit: MemLimit,
) -> anyhow::Result<(Vec<Task>, Vec<Skipped>)> {
    let mut tasks = vec![];
    let mut skipped = vec![];

    for gene in selection.genes.keys() {
        let lengths = match regions.lengths.get(gene) {
            Some(lengths) if !lengths.is_empty() => lengths,
            _ => continue,
        };
        let bed = bed_of
            .get(gene)
            .ok_or_else(|| anyhow::anyhow!("Gene {} not found in annotation", gene))?;

        let chains: Vec<u64> = lengths.keys().copied().collect();
        let max_query_len = lengths.values().copied().max().unwrap_or(0);
        let est = estimate(&bed.block_sizes, max_query_len);

        if est.gigabytes > mem_limit.gigabytes() {
            skipped.push(Skipped::new(
                gene,
                &chains,
                SkipReason::MemoryLimitExceeded {
                    limit: mem_limit,
                    needed: est.gigabytes,
                },
            ));
            continue;
        }

        tasks.push(Task {
            gene: gene.clone(),
            chains,
            memory: est.gigabytes,
            u12: hints.contains(gene),
        });
    }

    Ok((tasks, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::bed::read_bed;
    use crate::libs::ortholog::{Category, OrthologSelector};
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    #[test]
    fn test_num_states() {
        // 300 bp -> 100 codons -> 6 + 600 + 33
        assert_eq!(num_states(&[300]), 639);
        assert_eq!(num_states(&[300, 150]), 978);
        // partial codons are dropped
        assert_eq!(num_states(&[2]), 39);
        assert_eq!(num_states(&[]), 0);
    }

    #[test]
    fn test_hand_computed() {
        let est = estimate(&[300, 150], 1000);
        assert_eq!(est.num_states, 978);
        assert_eq!(est.ref_len, 450);
        // 31296 + 3912000 + 297312 + 19600 + 2900 + 100000
        assert_eq!(est.bytes, 4_363_108);
        assert_relative_eq!(est.gigabytes, 1.25);
    }

    #[test]
    fn test_rounds_up_whole_gigabytes() {
        // 3000 codons per exon, 100 kb query
        let est = estimate(&[9000, 9000], 100_000);
        let states = 2 * (6 + 6 * 3000 + 33);
        assert_eq!(est.num_states, states);
        let bytes =
            states * 32 + states * 100_000 * 4 + states * 304 + 218_000 * 8 + 118_000 * 2 + 100_000;
        assert_eq!(est.bytes, bytes);
        assert_relative_eq!(est.gigabytes, 15.25);
    }

    #[test]
    fn test_make_tasks() {
        let bed = "\
chr1\t0\t450\tG1\t0\t+\t0\t450\t0\t2\t300,150,\t0,300,
chr1\t0\t18000\tG2\t0\t+\t0\t18000\t0\t2\t9000,9000,\t0,9000,
chr1\t0\t450\tG3\t0\t+\t0\t450\t0\t2\t300,150,\t0,300,
";
        let bed_of = read_bed(bed.as_bytes()).unwrap();
        let selection = OrthologSelector::new(&[Category::Ortholog], false)
            .select("G1\t3,4\t0\t0\nG2\t5\t0\t0\nG3\t6\t0\t0\n".as_bytes())
            .unwrap();

        let mut regions = Regions::default();
        regions
            .lengths
            .insert("G2".to_string(), BTreeMap::from([(5, 100_000)]));
        regions
            .lengths
            .insert("G1".to_string(), BTreeMap::from([(3, 500), (4, 1000)]));
        // G3 lost all chains during projection

        let input = "h\nG1\t1\tdonor\n";
        let hints = IntronHints::read(input.as_bytes()).unwrap();
        let limit = MemLimit::Gigabytes(10.0);
        let (tasks, skipped) = make_tasks(&selection, &regions, &bed_of, &hints, limit).unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].gene, "G1");
        assert_eq!(tasks[0].chains, vec![3, 4]);
        assert_relative_eq!(tasks[0].memory, 1.25);
        assert!(tasks[0].u12);

        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].gene, "G2");
        assert_eq!(
            skipped[0].to_string(),
            "G2\t5\tmemory limit (10.0 gig) exceeded (needs 15.25)"
        );

        // a bucket ceiling is reported without a fraction
        let (_, skipped) =
            make_tasks(&selection, &regions, &bed_of, &hints, MemLimit::Ceiling(10)).unwrap();
        assert_eq!(
            skipped[0].to_string(),
            "G2\t5\tmemory limit (10 gig) exceeded (needs 15.25)"
        );
    }
}
