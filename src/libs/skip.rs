use crate::libs::memory::MemLimit;
use itertools::Itertools;

/// Why a gene, or some of its chains, did not make it into a job file.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoChains,
    OneToOneUnmet,
    ChainLimitExceeded(usize),
    AnomalousProjection,
    MemoryLimitExceeded { limit: MemLimit, needed: f64 },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SkipReason::NoChains => write!(f, "No chains intersecting the gene"),
            SkipReason::OneToOneUnmet => {
                write!(f, "Only one2one requested, this gene didn't pass")
            }
            SkipReason::ChainLimitExceeded(limit) => {
                write!(f, "number of chains ({} chains) limit exceeded", limit)
            }
            SkipReason::AnomalousProjection => write!(f, "too long query locus"),
            SkipReason::MemoryLimitExceeded { limit, needed } => {
                write!(f, "memory limit ({} gig) exceeded (needs {})", limit, needed)
            }
        }
    }
}

/// One skip-log entry. `chains` is empty when the whole gene was rejected before any
/// chain was looked at.
#[derive(Debug, Clone, PartialEq)]
pub struct Skipped {
    pub gene: String,
    pub chains: Vec<u64>,
    pub reason: SkipReason,
}

impl Skipped {
    pub fn new(gene: &str, chains: &[u64], reason: SkipReason) -> Self {
        Self {
            gene: gene.to_string(),
            chains: chains.to_vec(),
            reason,
        }
    }
}

impl std::fmt::Display for Skipped {
    /// ```
    /// # use exsplit::libs::skip::{SkipReason, Skipped};
    /// let entry = Skipped::new("ENST01", &[], SkipReason::NoChains);
    /// assert_eq!(entry.to_string(), "ENST01\t0\tNo chains intersecting the gene");
    ///
    /// let entry = Skipped::new("ENST02", &[9, 12], SkipReason::ChainLimitExceeded(2));
    /// assert_eq!(
    ///     entry.to_string(),
    ///     "ENST02\t9,12\tnumber of chains (2 chains) limit exceeded"
    /// );
    /// ```
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let chains = if self.chains.is_empty() {
            "0".to_string()
        } else {
            self.chains.iter().join(",")
        };
        write!(f, "{}\t{}\t{}", self.gene, chains, self.reason)
    }
}
