extern crate clap;
use clap::*;

mod cmd_sruscan;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = Command::new("sruscan")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`sruscan` - Small Regulatory Unit scanner")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_sruscan::search::make_subcommand())
        .subcommand(cmd_sruscan::cluster::make_subcommand())
        .after_help(
            r###"Subcommands:

* search  - BLAST a repeat database against a genome
* cluster - Reduce the matches to SRUs and CRISPR-like arrays

A typical run:

    sruscan search genome.fa --db repeats.fa -o search.tab
    sruscan cluster search.tab --genome genome.fa --db repeats.fa -o SRU-out

"###,
        );

    // Check which subcommand the user ran...
    match app.get_matches().subcommand() {
        Some(("search", sub_matches)) => cmd_sruscan::search::execute(sub_matches),
        Some(("cluster", sub_matches)) => cmd_sruscan::cluster::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
