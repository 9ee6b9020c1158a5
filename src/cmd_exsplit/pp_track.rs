use clap::{Arg, ArgMatches, Command};
use exsplit::libs::bed::read_bed;
use exsplit::libs::pseudo::{pp_regions, read_pp_chains};
use exsplit::libs::store::ChainIndex;
use std::io::Write;

pub fn make_subcommand() -> Command {
    Command::new("pp-track")
        .about("Create the processed pseudogenes annotation track")
        .after_help(
            r###"
* <chain_classification> has a header line; column 5 lists processed pseudogene chains
  per gene, `0` for none
* Each record is the query region of one `gene.chain` pair, on the `+` strand
  coordinates of the query, with strand `+` when chain and gene strands agree

"###,
        )
        .arg(
            Arg::new("chain_classification")
                .required(true)
                .index(1)
                .help("Chain classification table"),
        )
        .arg(
            Arg::new("chain_file")
                .required(true)
                .index(2)
                .help("Chain file (plain text, indexed on the fly)"),
        )
        .arg(
            Arg::new("bed_file")
                .required(true)
                .index(3)
                .help("Gene annotation, BED12"),
        )
        .arg(
            Arg::new("outfile")
                .required(true)
                .index(4)
                .help("Output BED9 filename. [stdout] for screen"),
        )
}

pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let classification = args.get_one::<String>("chain_classification").unwrap();
    let chain_file = args.get_one::<String>("chain_file").unwrap();
    let bed_file = args.get_one::<String>("bed_file").unwrap();
    let outfile = args.get_one::<String>("outfile").unwrap();

    let chains_of = read_pp_chains(exsplit::reader(classification)?)?;
    let bed_of = read_bed(exsplit::reader(bed_file)?)?;
    let index = ChainIndex::open(chain_file)?;

    let regions = pp_regions(&chains_of, &bed_of, &index)?;
    log::info!("{} processed pseudogene projections", regions.len());

    let mut writer = exsplit::writer(outfile)?;
    for region in &regions {
        writeln!(writer, "{}", region)?;
    }
    writer.flush()?;

    Ok(())
}
