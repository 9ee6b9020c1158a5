use assert_cmd::Command;
use std::fs;
use tempfile::tempdir;

#[test]
fn command_pp_track() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let classification = temp.path().join("class.tsv");
    let chains = temp.path().join("in.chain");
    let bed = temp.path().join("genes.bed");
    let output = temp.path().join("pp.bed");

    fs::write(
        &classification,
        "GENE\tORTH\tPARA\tTRANS\tP_PGENES\nG1\t1\t0\t0\t7\nG2\t1\t0\t0\t0\n",
    )?;
    fs::write(
        &chains,
        "chain 500 chr1 1000 + 0 300 chrQ 1000 - 100 400 7\n300\n",
    )?;
    fs::write(
        &bed,
        "chr1\t0\t300\tG1\t0\t+\t0\t300\t0\t1\t300,\t0,\n\
         chr1\t0\t300\tG2\t0\t+\t0\t300\t0\t1\t300,\t0,\n",
    )?;

    let mut cmd = Command::cargo_bin("exsplit")?;
    cmd.arg("pp-track")
        .arg(&classification)
        .arg(&chains)
        .arg(&bed)
        .arg(&output);
    cmd.assert().success();

    let content = fs::read_to_string(&output)?;
    assert_eq!(content, "chrQ\t600\t900\tG1.7\t100\t-\t600\t600\t250,50,200\n");

    Ok(())
}

#[test]
fn command_pp_track_stdout() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let classification = temp.path().join("class.tsv");
    let chains = temp.path().join("in.chain");
    let bed = temp.path().join("genes.bed");

    fs::write(&classification, "GENE\tA\tB\tC\tD\nG1\t0\t0\t0\t0\n")?;
    fs::write(&chains, "")?;
    fs::write(&bed, "chr1\t0\t300\tG1\t0\t+\t0\t300\t0\t1\t300,\t0,\n")?;

    let mut cmd = Command::cargo_bin("exsplit")?;
    let output = cmd
        .arg("pp-track")
        .arg(&classification)
        .arg(&chains)
        .arg(&bed)
        .arg("stdout")
        .output()?;

    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    Ok(())
}
