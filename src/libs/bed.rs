use anyhow::Context;
use indexmap::IndexMap;
use std::io::BufRead;
use std::str::FromStr;

/// The columns of a BED12 gene record used for job preparation.
#[derive(Debug, Clone, PartialEq)]
pub struct Bed {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub name: String,
    pub strand: char,
    pub block_sizes: Vec<u64>,
}

impl FromStr for Bed {
    type Err = anyhow::Error;

    /// ```
    /// # use exsplit::libs::bed::Bed;
    /// let line = "chr1\t100\t900\tENST01\t0\t-\t100\t900\t0\t2\t300,150,\t0,650,";
    /// let bed: Bed = line.parse().unwrap();
    /// assert_eq!((bed.start, bed.end), (100, 900));
    /// assert_eq!(bed.strand, '-');
    /// assert_eq!(bed.block_sizes, vec![300, 150]);
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.trim_end().split('\t').collect();
        if fields.len() < 12 {
            return Err(anyhow::anyhow!(
                "Invalid BED12 line: {} columns instead of 12",
                fields.len()
            ));
        }

        let block_sizes = fields[10]
            .split(',')
            .filter(|v| !v.is_empty())
            .map(|v| {
                v.parse::<u64>()
                    .map_err(|_| anyhow::anyhow!("Invalid block size: {}", v))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Bed {
            chrom: fields[0].to_string(),
            start: fields[1].parse()?,
            end: fields[2].parse()?,
            name: fields[3].to_string(),
            strand: fields[5].chars().next().unwrap_or('+'),
            block_sizes,
        })
    }
}

/// Load a BED12 file keyed by record name, in file order.
pub fn read_bed<R: BufRead>(reader: R) -> anyhow::Result<IndexMap<String, Bed>> {
    let mut bed_of = IndexMap::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') || line.starts_with("track") {
            continue;
        }
        let bed: Bed = line
            .parse()
            .with_context(|| format!("BED line {}", i + 1))?;
        bed_of.insert(bed.name.clone(), bed);
    }
    Ok(bed_of)
}
