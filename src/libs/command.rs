//! Rendering tasks into command lines and job files.

use crate::libs::bucket::{allocate, partition, Bucket};
use crate::libs::memory::Task;
use itertools::Itertools;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Everything a per-task wrapper call needs besides the task itself.
#[derive(Debug, Clone, Default)]
pub struct JobTemplate {
    pub wrapper: String,
    pub bed_index: String,
    pub chain_index: String,
    pub t_db: String,
    pub q_db: String,
    pub cesar_binary: String,
    pub uhq_flank: usize,
    pub mask_stops: bool,
    pub check_loss: bool,
    pub no_fpi: bool,
    pub u12: Option<String>,
}

impl JobTemplate {
    /// ```
    /// # use exsplit::libs::command::JobTemplate;
    /// # use exsplit::libs::memory::Task;
    /// let template = JobTemplate {
    ///     wrapper: "wrap".to_string(),
    ///     bed_index: "genes.bdb".to_string(),
    ///     chain_index: "chains.bdb".to_string(),
    ///     t_db: "t.2bit".to_string(),
    ///     q_db: "q.2bit".to_string(),
    ///     cesar_binary: "cesar".to_string(),
    ///     uhq_flank: 50,
    ///     mask_stops: true,
    ///     ..Default::default()
    /// };
    /// let task = Task { gene: "ENST01".to_string(), chains: vec![3, 12], memory: 2.25, u12: false };
    /// assert_eq!(
    ///     template.render(&task),
    ///     "wrap ENST01 3,12 genes.bdb chains.bdb t.2bit q.2bit --memlim 2.25 \
    ///      --cesar_binary cesar --uhq_flank 50 --mask_stops"
    /// );
    /// ```
    pub fn render(&self, task: &Task) -> String {
        let mut line = format!(
            "{} {} {} {} {} {} {} --memlim {} --cesar_binary {} --uhq_flank {}",
            self.wrapper,
            task.gene,
            task.chains.iter().join(","),
            self.bed_index,
            self.chain_index,
            self.t_db,
            self.q_db,
            task.memory,
            self.cesar_binary,
            self.uhq_flank,
        );
        if self.mask_stops {
            line.push_str(" --mask_stops");
        }
        if self.check_loss {
            line.push_str(" --check_loss");
        }
        if self.no_fpi {
            line.push_str(" --no_fpi");
        }
        if let Some(u12) = &self.u12 {
            if task.u12 {
                line.push_str(&format!(" --u12 {}", u12));
            }
        }
        line
    }
}

/// Per-file runner invocation written to the combined file.
#[derive(Debug, Clone, Default)]
pub struct RunnerTemplate {
    pub runner: String,
    pub results_dir: PathBuf,
    pub check_loss_dir: Option<PathBuf>,
    pub rejected_dir: Option<PathBuf>,
}

impl RunnerTemplate {
    /// `num` counts job files from 1.
    pub fn render(&self, num: usize, job_path: &Path) -> String {
        let file_name = job_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let basename = file_name.split('.').next().unwrap_or_default();

        let results_path = self.results_dir.join(format!("{}.bdb", basename));
        let mut line = format!(
            "{} {} {}",
            self.runner,
            job_path.display(),
            results_path.display()
        );
        if let Some(dir) = &self.check_loss_dir {
            let loss_path = dir.join(format!("{}.inact_mut.txt", basename));
            line.push_str(&format!(" --check_loss {}", loss_path.display()));
        }
        if let Some(dir) = &self.rejected_dir {
            let log_path = dir.join(format!("{}.txt", num));
            line.push_str(&format!(" --rejected_log {}", log_path.display()));
        }
        line
    }
}

/// A job file before it is written.
#[derive(Debug, Clone, PartialEq)]
pub struct JobFile {
    pub name: String,
    pub lines: Vec<String>,
}

/// Name and fill job files bucket by bucket; the counter in `cesar_job_{n}_{ceiling}`
/// runs across buckets.
pub fn plan_job_files(buckets: &[Bucket], jobs_num: usize, template: &JobTemplate) -> Vec<JobFile> {
    let files_per_bucket = allocate(buckets, jobs_num);
    let mut job_files = vec![];

    for (bucket, files) in buckets.iter().zip(files_per_bucket) {
        log::info!(
            "Bucket {}: {} tasks in {} files",
            bucket.ceiling,
            bucket.tasks.len(),
            files.min(bucket.tasks.len())
        );
        for part in partition(&bucket.tasks, files) {
            job_files.push(JobFile {
                name: format!("cesar_job_{}_{}", job_files.len() + 1, bucket.ceiling),
                lines: part.iter().map(|t| template.render(t)).collect(),
            });
        }
    }

    job_files
}

/// Write every job file into `jobs_dir`, returning their paths in order.
pub fn save_job_files(job_files: &[JobFile], jobs_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(jobs_dir)?;

    let mut paths = vec![];
    for job_file in job_files {
        let path = jobs_dir.join(&job_file.name);
        let mut writer = crate::writer(&path.to_string_lossy())?;
        for line in &job_file.lines {
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;
        paths.push(path);
    }
    Ok(paths)
}
