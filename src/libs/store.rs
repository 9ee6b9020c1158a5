use crate::libs::chain::{Chain, ChainReader};
use anyhow::Context;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Random access to chains by id.
pub trait ChainSource {
    fn fetch(&self, id: u64) -> anyhow::Result<Chain>;
}

impl ChainSource for BTreeMap<u64, Chain> {
    fn fetch(&self, id: u64) -> anyhow::Result<Chain> {
        self.get(&id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Chain {} not found", id))
    }
}

/// Byte offsets of every chain header in a plain-text chain file.
///
/// The file is scanned once on [`ChainIndex::open`]; each lookup seeks to the stored
/// offset and parses a single record.
#[derive(Debug)]
pub struct ChainIndex {
    path: PathBuf,
    offset_of: HashMap<u64, u64>,
}

impl ChainIndex {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if path.extension() == Some(std::ffi::OsStr::new("gz")) {
            return Err(anyhow::anyhow!(
                "{} is compressed; the chain index needs a seekable plain file",
                path.display()
            ));
        }

        let file = File::open(&path)
            .with_context(|| format!("could not open {}", path.display()))?;
        let mut reader = BufReader::new(file);

        let mut offset_of = HashMap::new();
        let mut offset = 0u64;
        let mut line = String::new();
        loop {
            line.clear();
            let n = reader.read_line(&mut line)?;
            if n == 0 {
                break;
            }
            if line.starts_with("chain") {
                let id = line
                    .split_whitespace()
                    .nth(12)
                    .and_then(|s| s.parse::<u64>().ok())
                    .ok_or_else(|| anyhow::anyhow!("Chain header without id: {}", line.trim()))?;
                if offset_of.insert(id, offset).is_some() {
                    log::warn!("Duplicated chain id {} in {}", id, path.display());
                }
            }
            offset += n as u64;
        }

        Ok(Self { path, offset_of })
    }
}

impl ChainSource for ChainIndex {
    fn fetch(&self, id: u64) -> anyhow::Result<Chain> {
        let offset = self
            .offset_of
            .get(&id)
            .ok_or_else(|| anyhow::anyhow!("Chain {} not found in {}", id, self.path.display()))?;

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(*offset))?;

        let chain = ChainReader::new(file)
            .next()
            .ok_or_else(|| anyhow::anyhow!("Chain {} truncated", id))??;
        if chain.header.id != id {
            return Err(anyhow::anyhow!(
                "Chain index out of date: expected {}, found {}",
                id,
                chain.header.id
            ));
        }
        Ok(chain)
    }
}
