//! Chain selection from the orthology table.
//!
//! Each row lists, per gene, the orthologous, paralogous and translocated chains
//! (`0` for none). Chains are taken from the requested categories in priority order; genes
//! with nothing in those categories fall back to every chain they have, tagged
//! [`Category::ParalogFallback`].

use crate::libs::skip::{SkipReason, Skipped};
use anyhow::Context;
use indexmap::IndexMap;
use std::io::BufRead;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Ortholog,
    Paralog,
    Translocated,
    ParalogFallback,
}

/// Categories whose projections are checked for implausibly long query loci.
/// The orthology table has no gap-spanning column, so only translocated chains qualify.
pub const LONG_LOCUS_CATEGORIES: &[Category] = &[Category::Translocated];

impl Category {
    pub fn is_long_locus(&self) -> bool {
        LONG_LOCUS_CATEGORIES.contains(self)
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ORTH" | "ORTHOLOG" => Ok(Category::Ortholog),
            "PARA" | "PARALOG" => Ok(Category::Paralog),
            "TRANS" | "TRANSLOCATED" => Ok(Category::Translocated),
            _ => Err(anyhow::anyhow!("Unknown chain category: {}", s)),
        }
    }
}

/// Parse a comma-separated priority list such as `ORTH,TRANS`.
///
/// ```
/// # use exsplit::libs::ortholog::{parse_fields, Category};
/// let fields = parse_fields("orth,TRANS,").unwrap();
/// assert_eq!(fields, vec![Category::Ortholog, Category::Translocated]);
/// assert!(parse_fields("PERF").is_err());
/// ```
pub fn parse_fields(s: &str) -> anyhow::Result<Vec<Category>> {
    s.split(',')
        .filter(|f| !f.trim().is_empty())
        .map(Category::from_str)
        .collect()
}

/// Comma-separated chain ids, `0` meaning an empty list.
pub fn parse_chain_ids(s: &str) -> anyhow::Result<Vec<u64>> {
    s.split(',')
        .map(|v| v.trim())
        .filter(|v| !v.is_empty() && *v != "0")
        .map(|v| {
            v.parse::<u64>()
                .map_err(|_| anyhow::anyhow!("Invalid chain id: {}", v))
        })
        .collect()
}

/// One data row of the orthology table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrthologRow {
    pub gene: String,
    pub orth: Vec<u64>,
    pub para: Vec<u64>,
    pub trans: Vec<u64>,
}

impl OrthologRow {
    pub fn chains(&self, category: Category) -> &[u64] {
        match category {
            Category::Ortholog => &self.orth,
            Category::Paralog => &self.para,
            Category::Translocated => &self.trans,
            Category::ParalogFallback => &[],
        }
    }

    pub fn all_chains(&self) -> Vec<u64> {
        self.orth
            .iter()
            .chain(&self.para)
            .chain(&self.trans)
            .copied()
            .collect()
    }
}

impl FromStr for OrthologRow {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s
            .trim_end_matches(|c: char| c == '\n' || c == '\r')
            .split('\t')
            .collect();
        if fields.len() < 4 {
            return Err(anyhow::anyhow!(
                "Invalid orthology line: {} columns instead of 4",
                fields.len()
            ));
        }
        Ok(OrthologRow {
            gene: fields[0].to_string(),
            orth: parse_chain_ids(fields[1])?,
            para: parse_chain_ids(fields[2])?,
            trans: parse_chain_ids(fields[3])?,
        })
    }
}

/// Chains picked for every gene, tagged with the category they came from.
#[derive(Debug, Default)]
pub struct Selection {
    pub genes: IndexMap<String, IndexMap<u64, Category>>,
    pub skipped: Vec<Skipped>,
}

impl Selection {
    pub fn category(&self, gene: &str, chain: u64) -> Option<Category> {
        self.genes.get(gene).and_then(|m| m.get(&chain)).copied()
    }

    /// `(gene, chain)` pairs that were only reachable through the paralog fallback.
    pub fn fallback_pairs(&self) -> Vec<(&str, u64)> {
        self.genes
            .iter()
            .flat_map(|(gene, chains)| {
                chains
                    .iter()
                    .filter(|(_, c)| **c == Category::ParalogFallback)
                    .map(move |(chain, _)| (gene.as_str(), *chain))
            })
            .collect()
    }
}

pub struct OrthologSelector {
    fields: Vec<Category>,
    o2o_only: bool,
}

impl OrthologSelector {
    pub fn new(fields: &[Category], o2o_only: bool) -> Self {
        Self {
            fields: fields.to_vec(),
            o2o_only,
        }
    }

    /// Chains selected for a single row, or the reason the gene is dropped.
    pub fn select_row(&self, row: &OrthologRow) -> Result<IndexMap<u64, Category>, Skipped> {
        let all_chains = row.all_chains();
        if all_chains.is_empty() {
            return Err(Skipped::new(&row.gene, &[], SkipReason::NoChains));
        }
        if self.o2o_only && row.orth.len() != 1 {
            return Err(Skipped::new(&row.gene, &[], SkipReason::OneToOneUnmet));
        }

        let mut selected: IndexMap<u64, Category> = IndexMap::new();
        for field in &self.fields {
            for chain in row.chains(*field) {
                selected.entry(*chain).or_insert(*field);
            }
        }

        if selected.is_empty() {
            for chain in all_chains {
                selected.entry(chain).or_insert(Category::ParalogFallback);
            }
        }

        Ok(selected)
    }

    /// Read the whole table. A table that yields no selection at all is an error.
    pub fn select<R: BufRead>(&self, reader: R) -> anyhow::Result<Selection> {
        let mut selection = Selection::default();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() || line.split('\t').next() == Some("GENE") {
                continue;
            }
            let row: OrthologRow = line
                .parse()
                .with_context(|| format!("orthology table line {}", i + 1))?;

            match self.select_row(&row) {
                Ok(chains) => {
                    selection.genes.insert(row.gene, chains);
                }
                Err(skipped) => selection.skipped.push(skipped),
            }
        }

        if selection.genes.is_empty() {
            return Err(anyhow::anyhow!(
                "No gene:chain pairs selected! Probably --fields parameter is wrong"
            ));
        }

        Ok(selection)
    }
}
