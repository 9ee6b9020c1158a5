use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use exsplit::libs::bed::read_bed;
use exsplit::libs::bucket::{classify, BucketSpec};
use exsplit::libs::command::{plan_job_files, save_job_files, JobTemplate, RunnerTemplate};
use exsplit::libs::convert::ChainConverter;
use exsplit::libs::memory::{make_tasks, MemLimit};
use exsplit::libs::ortholog::{parse_fields, OrthologSelector};
use exsplit::libs::region::RegionProjector;
use exsplit::libs::skip::Skipped;
use exsplit::libs::store::ChainIndex;
use exsplit::libs::u12::IntronHints;
use std::io::Write;
use std::path::PathBuf;

pub fn make_subcommand() -> Command {
    Command::new("jobs")
        .about("Split CESAR realignment tasks into cluster job files")
        .after_help(
            r###"
* <orthologs> is the output of the chain classifier: a header line starting with
  `GENE`, then gene, orthologous, paralogous and translocated chain ids
  (comma-separated, `0` for none)

* Chains are taken from --fields in priority order. A gene with none of them falls back
  to all of its chains; such pairs are listed in --paralogs-log

* --buckets 10,30 writes two job classes, `cesar_job_[n]_10` and `cesar_job_[n]_30`.
  Tasks needing more than 30 GB are skipped. --buckets 0 means no separation

* --jobs-num is split among buckets by `ceiling * task count`; the final number of files
  may differ slightly due to rounding

"###,
        )
        .arg(
            Arg::new("orthologs")
                .required(true)
                .index(1)
                .help("Orthology table"),
        )
        .arg(
            Arg::new("bed_file")
                .required(true)
                .index(2)
                .help("Gene annotation, BED12"),
        )
        .arg(
            Arg::new("bed_index")
                .required(true)
                .index(3)
                .help("Indexed gene annotation, passed to the wrapper"),
        )
        .arg(
            Arg::new("chain_index")
                .required(true)
                .index(4)
                .help("Chain file, read here and passed to the wrapper"),
        )
        .arg(
            Arg::new("t_db")
                .required(true)
                .index(5)
                .help("Target genome sequence"),
        )
        .arg(
            Arg::new("q_db")
                .required(true)
                .index(6)
                .help("Query genome sequence"),
        )
        .arg(
            Arg::new("cesar_binary")
                .long("cesar-binary")
                .num_args(1)
                .default_value("cesar")
                .help("CESAR binary, a path or a name on $PATH"),
        )
        .arg(
            Arg::new("wrapper")
                .long("wrapper")
                .num_args(1)
                .default_value("CESAR_wrapper.py")
                .help("Executor of a single task"),
        )
        .arg(
            Arg::new("runner")
                .long("runner")
                .num_args(1)
                .default_value("cesar_runner.py")
                .help("Executor of a whole job file"),
        )
        .arg(
            Arg::new("jobs_num")
                .long("jobs-num")
                .num_args(1)
                .default_value("300")
                .value_parser(value_parser!(usize))
                .help("Total number of cluster jobs"),
        )
        .arg(
            Arg::new("buckets")
                .long("buckets")
                .num_args(1)
                .default_value("0")
                .help("Comma-separated memory classes in GB, 0 for no split"),
        )
        .arg(
            Arg::new("fields")
                .long("fields")
                .num_args(1)
                .default_value("ORTH,TRANS")
                .help("Chain categories to use, in priority order: ORTH, PARA, TRANS"),
        )
        .arg(
            Arg::new("chains_limit")
                .long("chains-limit")
                .num_args(1)
                .default_value("15")
                .value_parser(value_parser!(usize))
                .help("Keep at most this many chains per gene, lowest ids first"),
        )
        .arg(
            Arg::new("mem_limit")
                .long("mem-limit")
                .num_args(1)
                .default_value("50")
                .value_parser(value_parser!(f64))
                .help("Skip genes requiring more than X GB"),
        )
        .arg(
            Arg::new("mask_stops")
                .long("mask-stops")
                .action(ArgAction::SetTrue)
                .help("Mask stop codons in target sequences"),
        )
        .arg(
            Arg::new("no_fpi")
                .long("no-fpi")
                .action(ArgAction::SetTrue)
                .help("Consider some frame-preserving mutations as inactivating"),
        )
        .arg(
            Arg::new("o2o_only")
                .long("o2o-only")
                .visible_alias("o2o")
                .action(ArgAction::SetTrue)
                .help("Process only genes with a single orthologous chain"),
        )
        .arg(
            Arg::new("skipped_genes")
                .long("skipped-genes")
                .num_args(1)
                .help("Write skipped genes and reasons to this file"),
        )
        .arg(
            Arg::new("paralogs_log")
                .long("paralogs-log")
                .num_args(1)
                .default_value("paralogs.log")
                .help("gene.chain pairs selected only through the paralog fallback"),
        )
        .arg(
            Arg::new("jobs_dir")
                .long("jobs-dir")
                .num_args(1)
                .default_value("cesar_jobs")
                .help("Directory of job files"),
        )
        .arg(
            Arg::new("combined")
                .long("combined")
                .num_args(1)
                .default_value("cesar_combined")
                .help("Combined cluster jobs file"),
        )
        .arg(
            Arg::new("results")
                .long("results")
                .num_args(1)
                .default_value("cesar_results")
                .help("Directory for results of the job files"),
        )
        .arg(
            Arg::new("check_loss")
                .long("check-loss")
                .num_args(1)
                .help("Run the gene loss check; inactivating mutations go to this directory"),
        )
        .arg(
            Arg::new("rejected_log")
                .long("rejected-log")
                .num_args(1)
                .help("Directory for per-job rejection logs"),
        )
        .arg(
            Arg::new("u12")
                .long("u12")
                .num_args(1)
                .help("U12 introns table"),
        )
        .arg(
            Arg::new("uhq_flank")
                .long("uhq-flank")
                .num_args(1)
                .default_value("50")
                .value_parser(value_parser!(usize))
                .help("UHQ flank size"),
        )
        .arg(
            Arg::new("flank_blocks")
                .long("flank-blocks")
                .num_args(1)
                .default_value("2")
                .value_parser(value_parser!(usize))
                .help("Chain blocks added on each side of a projected locus"),
        )
}

pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let start = std::time::Instant::now();

    let orthologs = args.get_one::<String>("orthologs").unwrap();
    let bed_file = args.get_one::<String>("bed_file").unwrap();
    let chain_index = args.get_one::<String>("chain_index").unwrap();
    let cesar_binary = args.get_one::<String>("cesar_binary").unwrap();

    let jobs_num = *args.get_one::<usize>("jobs_num").unwrap();
    let chains_limit = *args.get_one::<usize>("chains_limit").unwrap();
    let flank_blocks = *args.get_one::<usize>("flank_blocks").unwrap();

    let fields = parse_fields(args.get_one::<String>("fields").unwrap())?;
    let spec: BucketSpec = args.get_one::<String>("buckets").unwrap().parse()?;
    let mem_limit = match spec.max_ceiling() {
        Some(ceiling) => MemLimit::Ceiling(ceiling),
        None => MemLimit::Gigabytes(*args.get_one::<f64>("mem_limit").unwrap()),
    };

    let u12_file = args.get_one::<String>("u12").cloned();
    let check_loss = args.get_one::<String>("check_loss").map(PathBuf::from);
    let rejected_log = args.get_one::<String>("rejected_log").map(PathBuf::from);

    //----------------------------
    // Inputs
    //----------------------------
    let hints = match &u12_file {
        Some(path) => IntronHints::read(exsplit::reader(path)?)?,
        None => IntronHints::default(),
    };

    let selector = OrthologSelector::new(&fields, args.get_flag("o2o_only"));
    let selection = selector.select(exsplit::reader(orthologs)?)?;
    log::info!(
        "{} genes selected, {} skipped",
        selection.genes.len(),
        selection.skipped.len()
    );

    let bed_of = read_bed(exsplit::reader(bed_file)?)?;

    if !std::path::Path::new(cesar_binary).is_file() && which::which(cesar_binary).is_err() {
        return Err(anyhow::anyhow!(
            "Cannot find cesar executable at {}",
            cesar_binary
        ));
    }

    //----------------------------
    // Operating
    //----------------------------
    let index = ChainIndex::open(chain_index)?;
    let converter = ChainConverter::new(flank_blocks);
    let regions =
        RegionProjector::new(&bed_of, &index, &converter, chains_limit).project(&selection)?;

    let (tasks, mem_skipped) = make_tasks(&selection, &regions, &bed_of, &hints, mem_limit)?;
    log::info!("There are {} jobs in total", tasks.len());

    let (buckets, dropped) = classify(tasks, &spec);
    if !dropped.is_empty() {
        log::warn!("{} tasks exceed the largest bucket and were dropped", dropped.len());
    }

    let template = JobTemplate {
        wrapper: args.get_one::<String>("wrapper").unwrap().to_string(),
        bed_index: args.get_one::<String>("bed_index").unwrap().to_string(),
        chain_index: chain_index.to_string(),
        t_db: args.get_one::<String>("t_db").unwrap().to_string(),
        q_db: args.get_one::<String>("q_db").unwrap().to_string(),
        cesar_binary: cesar_binary.to_string(),
        uhq_flank: *args.get_one::<usize>("uhq_flank").unwrap(),
        mask_stops: args.get_flag("mask_stops"),
        check_loss: check_loss.is_some(),
        no_fpi: args.get_flag("no_fpi"),
        u12: u12_file,
    };
    let job_files = plan_job_files(&buckets, jobs_num, &template);

    //----------------------------
    // Output
    //----------------------------
    let jobs_dir = PathBuf::from(args.get_one::<String>("jobs_dir").unwrap());
    let paths = save_job_files(&job_files, &jobs_dir)?;

    let results_dir = PathBuf::from(args.get_one::<String>("results").unwrap());
    std::fs::create_dir_all(&results_dir)?;
    if let Some(dir) = &check_loss {
        std::fs::create_dir_all(dir)?;
    }
    if let Some(dir) = &rejected_log {
        std::fs::create_dir_all(dir)?;
    }

    let runner = RunnerTemplate {
        runner: args.get_one::<String>("runner").unwrap().to_string(),
        results_dir,
        check_loss_dir: check_loss,
        rejected_dir: rejected_log,
    };
    let mut writer = exsplit::writer(args.get_one::<String>("combined").unwrap())?;
    for (i, path) in paths.iter().enumerate() {
        writeln!(writer, "{}", runner.render(i + 1, path))?;
    }
    writer.flush()?;

    if let Some(skipped_file) = args.get_one::<String>("skipped_genes") {
        let skipped: Vec<&Skipped> = selection
            .skipped
            .iter()
            .chain(&regions.skipped)
            .chain(&mem_skipped)
            .collect();
        if let Err(err) = write_skipped(skipped_file, &skipped) {
            log::warn!("Could not save skipped genes to {}: {:#}", skipped_file, err);
        }
    }

    let mut writer = exsplit::writer(args.get_one::<String>("paralogs_log").unwrap())?;
    for (gene, chain) in selection.fallback_pairs() {
        writeln!(writer, "{}.{}", gene, chain)?;
    }
    writer.flush()?;

    log::info!("{} job files written in {:.2?}", paths.len(), start.elapsed());

    Ok(())
}

fn write_skipped(path: &str, skipped: &[&Skipped]) -> anyhow::Result<()> {
    let mut writer = exsplit::writer(path)?;
    for entry in skipped {
        writeln!(writer, "{}", entry)?;
    }
    writer.flush()?;
    Ok(())
}
