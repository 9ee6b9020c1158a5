use anyhow::Context;
use std::collections::HashSet;
use std::io::BufRead;

/// Transcripts carrying U12 intron hints.
#[derive(Debug, Default, Clone)]
pub struct IntronHints {
    genes: HashSet<String>,
}

impl IntronHints {
    /// Read `transcript<TAB>exon number<TAB>site`, skipping the header line.
    pub fn read<R: BufRead>(reader: R) -> anyhow::Result<Self> {
        let mut genes = HashSet::new();
        for (i, line) in reader.lines().enumerate().skip(1) {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 3 {
                return Err(anyhow::anyhow!("U12 line {}: expected 3 columns", i + 1));
            }
            fields[1]
                .parse::<u32>()
                .with_context(|| format!("U12 line {}: exon number", i + 1))?;
            genes.insert(fields[0].to_string());
        }
        Ok(Self { genes })
    }

    pub fn contains(&self, gene: &str) -> bool {
        self.genes.contains(gene)
    }
}
