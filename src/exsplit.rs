extern crate clap;
use clap::*;

mod cmd_exsplit;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let app = Command::new("exsplit")
        .version(crate_version!())
        .about("`exsplit` - Exon realignment job splitter")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_exsplit::jobs::make_subcommand())
        .subcommand(cmd_exsplit::pp_track::make_subcommand())
        .after_help(
            r###"Subcommands:

* jobs     - Select chains per gene and write memory-balanced CESAR job files
* pp-track - BED9 track of processed pseudogene projections

Set RUST_LOG=debug for per-chain progress.

"###,
        );

    match app.get_matches().subcommand() {
        Some(("jobs", sub_matches)) => cmd_exsplit::jobs::execute(sub_matches),
        Some(("pp-track", sub_matches)) => cmd_exsplit::pp_track::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
