use std::io::BufRead;
use std::str::FromStr;

/// Header line of a UCSC chain record:
/// `chain score tName tSize tStrand tStart tEnd qName qSize qStrand qStart qEnd id`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainHeader {
    pub score: f64,
    pub t_name: String,
    pub t_size: u64,
    pub t_strand: char,
    pub t_start: u64,
    pub t_end: u64,
    pub q_name: String,
    pub q_size: u64,
    pub q_strand: char,
    pub q_start: u64,
    pub q_end: u64,
    pub id: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainData {
    pub size: u64,
    pub dt: u64,
    pub dq: u64,
}

/// Ungapped block in absolute coordinates, 0-based half-open.
/// Query coordinates are on the chain's query strand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub t_start: u64,
    pub t_end: u64,
    pub q_start: u64,
    pub q_end: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chain {
    pub header: ChainHeader,
    pub data: Vec<ChainData>,
}

impl ChainHeader {
    /// Query interval of the whole chain on the `+` strand.
    ///
    /// ```
    /// # use std::str::FromStr;
    /// # use exsplit::libs::chain::ChainHeader;
    /// let header =
    ///     ChainHeader::from_str("chain 100 chr1 5000 + 0 300 chr2 1000 - 100 400 7").unwrap();
    /// assert_eq!(header.q_plus_range(), (600, 900));
    /// ```
    pub fn q_plus_range(&self) -> (u64, u64) {
        flip_if_minus(self.q_strand, self.q_size, self.q_start, self.q_end)
    }
}

/// Convert a query interval to `+` strand coordinates when `strand` is `-`.
pub fn flip_if_minus(strand: char, size: u64, start: u64, end: u64) -> (u64, u64) {
    if strand == '-' {
        (size.saturating_sub(end), size.saturating_sub(start))
    } else {
        (start, end)
    }
}

impl Chain {
    /// Convert chain data (relative coordinates) to blocks (absolute coordinates).
    ///
    /// Both cursors start at the header's start; every line advances target and query by
    /// `size`, then by `dt` and `dq` respectively.
    pub fn to_blocks(&self) -> Vec<Block> {
        let mut blocks = Vec::with_capacity(self.data.len());
        let mut t_curr = self.header.t_start;
        let mut q_curr = self.header.q_start;

        for d in &self.data {
            blocks.push(Block {
                t_start: t_curr,
                t_end: t_curr + d.size,
                q_start: q_curr,
                q_end: q_curr + d.size,
            });

            t_curr += d.size + d.dt;
            q_curr += d.size + d.dq;
        }

        blocks
    }
}

fn strand_of(s: &str) -> anyhow::Result<char> {
    match s {
        "+" => Ok('+'),
        "-" => Ok('-'),
        _ => Err(anyhow::anyhow!("Invalid strand: {}", s)),
    }
}

impl FromStr for ChainHeader {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.len() < 13 || parts[0] != "chain" {
            return Err(anyhow::anyhow!("Invalid chain header line: {}", s));
        }

        Ok(ChainHeader {
            score: parts[1].parse()?,
            t_name: parts[2].to_string(),
            t_size: parts[3].parse()?,
            t_strand: strand_of(parts[4])?,
            t_start: parts[5].parse()?,
            t_end: parts[6].parse()?,
            q_name: parts[7].to_string(),
            q_size: parts[8].parse()?,
            q_strand: strand_of(parts[9])?,
            q_start: parts[10].parse()?,
            q_end: parts[11].parse()?,
            id: parts[12].parse()?,
        })
    }
}

fn parse_data_line(line: &str) -> anyhow::Result<ChainData> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.len() {
        1 => Ok(ChainData {
            size: parts[0].parse()?,
            dt: 0,
            dq: 0,
        }),
        3 => Ok(ChainData {
            size: parts[0].parse()?,
            dt: parts[1].parse()?,
            dq: parts[2].parse()?,
        }),
        _ => Err(anyhow::anyhow!("Invalid chain data line: {}", line)),
    }
}

pub struct ChainReader<R> {
    reader: std::io::BufReader<R>,
    next_line: Option<String>,
}

impl<R: std::io::Read> ChainReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: std::io::BufReader::new(inner),
            next_line: None,
        }
    }

    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        if let Some(line) = self.next_line.take() {
            return Ok(Some(line));
        }
        let mut buf = String::new();
        let n = self.reader.read_line(&mut buf)?;
        if n == 0 {
            Ok(None)
        } else {
            Ok(Some(buf))
        }
    }

    fn push_back(&mut self, line: String) {
        self.next_line = Some(line);
    }

    fn read_chain(&mut self) -> anyhow::Result<Option<Chain>> {
        let header_line = loop {
            match self.read_line()? {
                Some(line) => {
                    let trimmed = line.trim();
                    if trimmed.starts_with("chain") {
                        break trimmed.to_string();
                    }
                    // blank lines, comments and stray data before a header
                }
                None => return Ok(None),
            }
        };

        let header = ChainHeader::from_str(&header_line)?;
        let mut data = Vec::new();

        while let Some(line) = self.read_line()? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }
            if trimmed.starts_with("chain") {
                self.push_back(line);
                break;
            }
            data.push(parse_data_line(trimmed)?);
        }

        Ok(Some(Chain { header, data }))
    }
}

impl<R: std::io::Read> Iterator for ChainReader<R> {
    type Item = anyhow::Result<Chain>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_chain().transpose()
    }
}

pub fn read_chains<R: std::io::Read>(reader: R) -> anyhow::Result<Vec<Chain>> {
    ChainReader::new(reader).collect()
}
