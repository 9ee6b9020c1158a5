use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const ORTHOLOGS: &str = "\
GENE\tORTH\tPARA\tTRANS
G1\t2,1\t0\t0
G2\t2\t0\t0
G3\t0\t0\t0
G4\t0\t3\t0
";

const BED: &str = "\
chr1\t100\t400\tG1\t0\t+\t100\t400\t0\t1\t300,\t0,
chr1\t150\t300\tG2\t0\t-\t150\t300\t0\t1\t150,\t0,
chr1\t500\t600\tG3\t0\t+\t500\t600\t0\t1\t100,\t0,
chr1\t600\t900\tG4\t0\t+\t600\t900\t0\t1\t300,\t0,
";

const CHAINS: &str = "\
chain 1000 chr1 1000 + 0 1000 q1 1000 + 0 1000 1
1000

chain 900 chr1 1000 + 0 1000 q2 2000 - 0 1000 2
1000

chain 800 chr1 1000 + 0 1000 q3 1000 + 0 1000 3
1000
";

fn setup(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    fs::write(dir.join("orthologs.tsv"), ORTHOLOGS)?;
    fs::write(dir.join("genes.bed"), BED)?;
    fs::write(dir.join("in.chain"), CHAINS)?;
    fs::write(dir.join("cesar_bin"), "")?;
    Ok(())
}

fn jobs_cmd(dir: &Path, cesar: &str) -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("exsplit")?;
    cmd.current_dir(dir)
        .arg("jobs")
        .arg("orthologs.tsv")
        .arg("genes.bed")
        .arg("genes.bdb")
        .arg("in.chain")
        .arg("t.2bit")
        .arg("q.2bit")
        .arg("--cesar-binary")
        .arg(cesar);
    Ok(cmd)
}

#[test]
fn command_jobs_default() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    setup(temp.path())?;

    let mut cmd = jobs_cmd(temp.path(), "cesar_bin")?;
    cmd.arg("--chains-limit")
        .arg("1")
        .arg("--skipped-genes")
        .arg("skipped.tsv")
        .arg("--paralogs-log")
        .arg("para.log");
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("There are 3 jobs in total"));

    // one file per task: 300 requested, 3 tasks
    let jobs_dir = temp.path().join("cesar_jobs");
    assert_eq!(fs::read_dir(&jobs_dir)?.count(), 3);
    let job1 = fs::read_to_string(jobs_dir.join("cesar_job_1_0"))?;
    assert_eq!(
        job1,
        "CESAR_wrapper.py G1 1 genes.bdb in.chain t.2bit q.2bit --memlim 1.25 \
         --cesar_binary cesar_bin --uhq_flank 50\n"
    );
    let job3 = fs::read_to_string(jobs_dir.join("cesar_job_3_0"))?;
    assert!(job3.starts_with("CESAR_wrapper.py G4 3 "));

    let combined = fs::read_to_string(temp.path().join("cesar_combined"))?;
    let lines: Vec<&str> = combined.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "cesar_runner.py cesar_jobs/cesar_job_1_0 cesar_results/cesar_job_1_0.bdb"
    );
    assert!(temp.path().join("cesar_results").is_dir());

    let skipped = fs::read_to_string(temp.path().join("skipped.tsv"))?;
    assert_eq!(
        skipped,
        "G3\t0\tNo chains intersecting the gene\n\
         G1\t2\tnumber of chains (1 chains) limit exceeded\n"
    );

    let para = fs::read_to_string(temp.path().join("para.log"))?;
    assert_eq!(para, "G4.3\n");

    Ok(())
}

#[test]
fn command_jobs_buckets() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    setup(temp.path())?;

    let mut cmd = jobs_cmd(temp.path(), "cesar_bin")?;
    cmd.arg("--buckets")
        .arg("2,10")
        .arg("--jobs-num")
        .arg("1")
        .arg("--mask-stops")
        .arg("--check-loss")
        .arg("loss")
        .arg("--rejected-log")
        .arg("rejected");
    cmd.assert().success();

    let job = fs::read_to_string(temp.path().join("cesar_jobs/cesar_job_1_2"))?;
    let lines: Vec<&str> = job.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("CESAR_wrapper.py G1 1,2 "));
    assert!(lines[0].ends_with(" --mask_stops --check_loss"));

    let combined = fs::read_to_string(temp.path().join("cesar_combined"))?;
    assert_eq!(
        combined,
        "cesar_runner.py cesar_jobs/cesar_job_1_2 cesar_results/cesar_job_1_2.bdb \
         --check_loss loss/cesar_job_1_2.inact_mut.txt --rejected_log rejected/1.txt\n"
    );
    assert!(temp.path().join("loss").is_dir());

    Ok(())
}

#[test]
fn command_jobs_memory_limit() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    setup(temp.path())?;

    let mut cmd = jobs_cmd(temp.path(), "cesar_bin")?;
    cmd.arg("--mem-limit")
        .arg("1")
        .arg("--skipped-genes")
        .arg("skipped.tsv");
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("There are 0 jobs in total"));

    let skipped = fs::read_to_string(temp.path().join("skipped.tsv"))?;
    assert!(skipped.contains("G2\t2\tmemory limit (1.0 gig) exceeded (needs 1.25)"));
    assert_eq!(skipped.lines().count(), 4);
    assert_eq!(fs::read_to_string(temp.path().join("cesar_combined"))?, "");

    Ok(())
}

#[test]
fn command_jobs_u12() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    setup(temp.path())?;
    fs::write(temp.path().join("u12.tsv"), "trans\texon\tsite\nG2\t1\tdonor\n")?;

    let mut cmd = jobs_cmd(temp.path(), "cesar_bin")?;
    cmd.arg("--u12").arg("u12.tsv").arg("--no-fpi");
    cmd.assert().success();

    let g1 = fs::read_to_string(temp.path().join("cesar_jobs/cesar_job_1_0"))?;
    let g2 = fs::read_to_string(temp.path().join("cesar_jobs/cesar_job_2_0"))?;
    assert!(g1.trim_end().ends_with("--no_fpi"));
    assert!(g2.trim_end().ends_with("--no_fpi --u12 u12.tsv"));

    Ok(())
}

#[test]
fn command_jobs_is_stable() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    setup(temp.path())?;

    jobs_cmd(temp.path(), "cesar_bin")?.arg("--jobs-num").arg("2").assert().success();
    let first: Vec<String> = ["cesar_job_1_0", "cesar_job_2_0"]
        .iter()
        .map(|f| fs::read_to_string(temp.path().join("cesar_jobs").join(f)))
        .collect::<Result<_, _>>()?;

    jobs_cmd(temp.path(), "cesar_bin")?.arg("--jobs-num").arg("2").assert().success();
    let second: Vec<String> = ["cesar_job_1_0", "cesar_job_2_0"]
        .iter()
        .map(|f| fs::read_to_string(temp.path().join("cesar_jobs").join(f)))
        .collect::<Result<_, _>>()?;

    assert_eq!(first, second);
    // 3 tasks in 2 files: the remainder joins the last one
    assert_eq!(first[0].lines().count(), 1);
    assert_eq!(first[1].lines().count(), 2);

    Ok(())
}

#[test]
fn command_jobs_missing_binary() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    setup(temp.path())?;

    let mut cmd = jobs_cmd(temp.path(), "no_such_cesar_binary_here")?;
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains(
            "Cannot find cesar executable at no_such_cesar_binary_here",
        ));
    assert!(!temp.path().join("cesar_jobs").exists());

    Ok(())
}

#[test]
fn command_jobs_skip_log_not_fatal() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    setup(temp.path())?;

    let mut cmd = jobs_cmd(temp.path(), "cesar_bin")?;
    cmd.arg("--skipped-genes").arg("nodir/skip.tsv");
    cmd.assert()
        .success()
        .stderr(predicate::str::contains(
            "Could not save skipped genes to nodir/skip.tsv",
        ));

    assert!(!temp.path().join("nodir").exists());
    assert_eq!(fs::read_dir(temp.path().join("cesar_jobs"))?.count(), 3);
    assert_eq!(fs::read_to_string(temp.path().join("paralogs.log"))?, "G4.3\n");

    Ok(())
}

#[test]
fn command_jobs_nothing_selected() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    setup(temp.path())?;

    // G1 has two orthologs, G3 none
    fs::write(
        temp.path().join("orthologs.tsv"),
        "GENE\tORTH\tPARA\tTRANS\nG1\t2,1\t0\t0\nG3\t0\t0\t0\n",
    )?;
    let mut cmd = jobs_cmd(temp.path(), "cesar_bin")?;
    cmd.arg("--o2o");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No gene:chain pairs selected"));

    let mut cmd = jobs_cmd(temp.path(), "cesar_bin")?;
    cmd.arg("--fields").arg("PERF");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unknown chain category"));

    Ok(())
}
