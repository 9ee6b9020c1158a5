//! Memory classes of tasks and their split into job files.
//!
//! A bucket with ceiling `c` holds tasks needing `(previous ceiling, c]` GB. The number of
//! job files per bucket follows its share of `ceiling * task_count`, a proxy for the
//! cluster time the bucket will consume.

use crate::libs::memory::Task;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum BucketSpec {
    Unbounded,
    Ceilings(Vec<u64>),
}

impl BucketSpec {
    /// Memory limit implied by the buckets, if any.
    pub fn max_ceiling(&self) -> Option<u64> {
        match self {
            BucketSpec::Unbounded => None,
            BucketSpec::Ceilings(c) => c.last().copied(),
        }
    }
}

impl FromStr for BucketSpec {
    type Err = anyhow::Error;

    /// ```
    /// # use exsplit::libs::bucket::BucketSpec;
    /// assert_eq!("0".parse::<BucketSpec>().unwrap(), BucketSpec::Unbounded);
    /// assert_eq!(
    ///     "30,10,".parse::<BucketSpec>().unwrap(),
    ///     BucketSpec::Ceilings(vec![10, 30])
    /// );
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == "0" {
            return Ok(BucketSpec::Unbounded);
        }
        let mut ceilings = s
            .split(',')
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(|v| {
                v.parse::<u64>()
                    .map_err(|_| anyhow::anyhow!("Invalid bucket: {}", v))
            })
            .collect::<Result<Vec<_>, _>>()?;
        ceilings.sort_unstable();
        ceilings.dedup();

        if ceilings.is_empty() || ceilings[0] == 0 {
            return Err(anyhow::anyhow!(
                "Buckets must be positive memory levels, or 0 for no split: {}",
                s
            ));
        }
        Ok(BucketSpec::Ceilings(ceilings))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    /// `0` for the unbounded bucket
    pub ceiling: u64,
    pub tasks: Vec<Task>,
}

impl Bucket {
    pub fn weight(&self) -> u64 {
        self.ceiling * self.tasks.len() as u64
    }
}

/// Sort tasks into buckets, keeping their order. Returns the non-empty buckets in
/// ascending order and the tasks above the largest ceiling.
pub fn classify(tasks: Vec<Task>, spec: &BucketSpec) -> (Vec<Bucket>, Vec<Task>) {
    let ceilings = match spec {
        BucketSpec::Unbounded => {
            if tasks.is_empty() {
                return (vec![], vec![]);
            }
            return (vec![Bucket { ceiling: 0, tasks }], vec![]);
        }
        BucketSpec::Ceilings(c) => c,
    };

    let mut buckets: Vec<Bucket> = ceilings
        .iter()
        .map(|c| Bucket {
            ceiling: *c,
            tasks: vec![],
        })
        .collect();
    let mut dropped = vec![];

    for task in tasks {
        match ceilings.iter().position(|c| task.memory <= *c as f64) {
            Some(i) => buckets[i].tasks.push(task),
            None => dropped.push(task),
        }
    }

    buckets.retain(|b| !b.tasks.is_empty());
    (buckets, dropped)
}

/// Job files per bucket: `ceil(jobs_num * weight / sum_of_weights)`. A lone unbounded
/// bucket gets all `jobs_num` files. [`partition`] caps the count at the bucket size.
///
/// ```
/// # use exsplit::libs::bucket::{allocate, Bucket};
/// # use exsplit::libs::memory::Task;
/// let task = Task { gene: "G".to_string(), chains: vec![1], memory: 5.25, u12: false };
/// let buckets = vec![
///     Bucket { ceiling: 10, tasks: vec![task.clone(); 30] },
///     Bucket { ceiling: 30, tasks: vec![task.clone(); 10] },
/// ];
/// assert_eq!(allocate(&buckets, 100), vec![50, 50]);
/// ```
pub fn allocate(buckets: &[Bucket], jobs_num: usize) -> Vec<usize> {
    let unbounded = buckets.len() == 1 && buckets[0].ceiling == 0;
    let weight_sum: u64 = buckets.iter().map(Bucket::weight).sum();

    buckets
        .iter()
        .map(|b| {
            if unbounded || weight_sum == 0 {
                jobs_num
            } else {
                let prop = b.weight() as f64 / weight_sum as f64;
                (jobs_num as f64 * prop).ceil() as usize
            }
        })
        .collect()
}

/// Split `tasks` into exactly `files` contiguous chunks of `len / files` tasks; the
/// remainder goes to the last chunk.
pub fn partition(tasks: &[Task], files: usize) -> Vec<&[Task]> {
    if tasks.is_empty() {
        return vec![];
    }
    let files = files.clamp(1, tasks.len());
    let size = tasks.len() / files;

    let mut parts = Vec::with_capacity(files);
    for i in 0..files {
        let start = i * size;
        let end = if i + 1 == files { tasks.len() } else { start + size };
        parts.push(&tasks[start..end]);
    }
    parts
}
