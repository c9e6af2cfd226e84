use clap::*;
use std::fs;
use std::io::Write;
use std::path::Path;

use sruscan::libs::cluster;
use sruscan::libs::hit::{self, RepeatLengths};
use sruscan::libs::report;
use sruscan::libs::seq::SeqMap;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("cluster")
        .about("Reduce repeat matches to SRUs and CRISPR-like arrays")
        .after_help(
            r###"
This command takes the tabular search result produced by `sruscan search`
(BLAST -outfmt 6: repeat id, accession, identity, alignment length,
mismatches, gaps, repeat start/end, accession start/end, e-value, score)
and reduces it to isolated repeats (SRUs) and repeat-spacer arrays.

Stages:
1. Coverage is computed against the repeat database; matches below
   --identity or --coverage-part are dropped.
2. Per accession, overlapping matches are resolved greedily, best score
   first.
3. Matches with coverage >= --coverage are clustered by positional
   adjacency (--max-dist).
4. Partial matches (coverage below --coverage) adjacent to a cluster are
   appended when their sequence matches a cluster member.
5. Single-member clusters are reported as SRUs, larger ones as arrays with
   their spacers.

Output files in --outdir:
* arguments.tab - the options of this run
* matches.tab   - best hits after overlap resolution
* sru.tab       - isolated repeats with flanking sequence
* arrays.tab    - arrays with member repeats, types and spacers
* spacers.fa    - all spacer sequences, named {acc}_{cluster}:{index}

Notes:
* Coordinates are 1-based, inclusive.
* Flanks are clipped at contig boundaries.
* A run with no admissible matches reports the reason and writes
  header-only tables.

Examples:
1. Defaults:
   sruscan cluster search.tab --genome genome.fa --db repeats.fa

2. Tighter arrays, longer flanks:
   sruscan cluster search.tab --genome genome.fa --db repeats.fa \
       --max-dist 50 --flank 200 -o SRU-strict

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Tabular search result to process"),
        )
        .arg(
            Arg::new("genome")
                .long("genome")
                .short('g')
                .required(true)
                .num_args(1)
                .help("Genome FASTA; source of repeat, spacer and flank sequences"),
        )
        .arg(
            Arg::new("db")
                .long("db")
                .short('d')
                .required(true)
                .num_args(1)
                .help("Repeat database FASTA; source of repeat lengths"),
        )
        .arg(
            Arg::new("identity")
                .long("identity")
                .value_parser(value_parser!(f64))
                .num_args(1)
                .default_value("90")
                .help("Minimum percent identity of a match"),
        )
        .arg(
            Arg::new("coverage")
                .long("coverage")
                .value_parser(value_parser!(f64))
                .num_args(1)
                .default_value("90")
                .help("Minimum percent coverage of a complete match"),
        )
        .arg(
            Arg::new("coverage_part")
                .long("coverage-part")
                .value_parser(value_parser!(f64))
                .num_args(1)
                .default_value("50")
                .help("Minimum percent coverage of a partial match"),
        )
        .arg(
            Arg::new("max_dist")
                .long("max-dist")
                .value_parser(value_parser!(i32))
                .num_args(1)
                .default_value("100")
                .help("Maximum gap between matches of one cluster"),
        )
        .arg(
            Arg::new("flank")
                .long("flank")
                .value_parser(value_parser!(i32))
                .num_args(1)
                .default_value("100")
                .help("Length of the flanking sequence to report"),
        )
        .arg(
            Arg::new("spacer_identity")
                .long("spacer-identity")
                .value_parser(value_parser!(f64))
                .num_args(1)
                .default_value("90")
                .help("Minimum percent identity for spacer filtering"),
        )
        .arg(
            Arg::new("spacer_coverage")
                .long("spacer-coverage")
                .value_parser(value_parser!(f64))
                .num_args(1)
                .default_value("50")
                .help("Minimum percent coverage for spacer filtering"),
        )
        .arg(
            Arg::new("outdir")
                .long("outdir")
                .short('o')
                .num_args(1)
                .default_value("SRU-out")
                .help("Output location"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let infile = args.get_one::<String>("infile").unwrap();
    let genome_file = args.get_one::<String>("genome").unwrap();
    let db_file = args.get_one::<String>("db").unwrap();
    let identity = *args.get_one::<f64>("identity").unwrap();
    let coverage = *args.get_one::<f64>("coverage").unwrap();
    let coverage_part = *args.get_one::<f64>("coverage_part").unwrap();
    let max_dist = *args.get_one::<i32>("max_dist").unwrap();
    let flank = *args.get_one::<i32>("flank").unwrap();
    let spacer_identity = *args.get_one::<f64>("spacer_identity").unwrap();
    let spacer_coverage = *args.get_one::<f64>("spacer_coverage").unwrap();
    let outdir = args.get_one::<String>("outdir").unwrap();

    fs::create_dir_all(outdir)?;

    {
        let mut writer = sruscan::writer(&outfile(outdir, "arguments.tab"));
        for (key, value) in [
            ("input", infile.to_string()),
            ("genome", genome_file.to_string()),
            ("db", db_file.to_string()),
            ("identity", identity.to_string()),
            ("coverage", coverage.to_string()),
            ("coverage_part", coverage_part.to_string()),
            ("max_dist", max_dist.to_string()),
            ("flank", flank.to_string()),
            ("spacer_identity", spacer_identity.to_string()),
            ("spacer_coverage", spacer_coverage.to_string()),
            ("outdir", outdir.to_string()),
        ] {
            writer.write_fmt(format_args!("{}:\t{}\n", key, value))?;
        }
    }

    //----------------------------
    // Load & filter
    //----------------------------
    let lengths = RepeatLengths::from_fasta(db_file)?;
    if lengths.is_empty() {
        anyhow::bail!("repeat database {} contains no sequences", db_file);
    }
    let genome = SeqMap::from_fasta(genome_file)?;
    if genome.is_empty() {
        anyhow::bail!("genome {} contains no sequences", genome_file);
    }

    let hits = hit::read_hits(sruscan::reader(infile), &lengths)?;
    let hits = hit::filter_hits(hits, identity, coverage_part);

    if hits.is_empty() {
        log::info!(
            "No matches with identity >= {}% and coverage >= {}% found",
            identity,
            coverage_part
        );
        write_empty_matches(outdir)?;
        write_empty_reports(outdir)?;
        return Ok(());
    }

    //----------------------------
    // Overlap resolution
    //----------------------------
    log::info!("Removing overlapping matches");
    let best = cluster::remove_overlap(hits);
    {
        let mut writer = sruscan::writer(&outfile(outdir, "matches.tab"));
        report::write_matches(writer.as_mut(), &best)?;
    }

    //----------------------------
    // Clustering
    //----------------------------
    log::info!("Clustering matches");
    let (complete, partial): (Vec<_>, Vec<_>) =
        best.into_iter().partition(|h| h.coverage >= coverage);

    if complete.is_empty() {
        log::info!("No matches with coverage >= {}% found", coverage);
        write_empty_reports(outdir)?;
        return Ok(());
    }

    let mut clusters = cluster::cluster_adjacent(complete, max_dist);

    log::info!("Appending partial matches");
    cluster::append_partials(&mut clusters, &partial, max_dist, identity, &genome)?;

    //----------------------------
    // Classification & output
    //----------------------------
    let (srus, arrays) = report::classify(&clusters, &genome, flank)?;
    log::info!(
        "Found {} isolated repeats and {} arrays",
        srus.len(),
        arrays.len()
    );

    let mut writer = sruscan::writer(&outfile(outdir, "sru.tab"));
    report::write_srus(writer.as_mut(), &srus)?;

    let mut writer = sruscan::writer(&outfile(outdir, "arrays.tab"));
    report::write_arrays(writer.as_mut(), &arrays)?;

    let mut writer = sruscan::writer(&outfile(outdir, "spacers.fa"));
    report::write_spacers(writer.as_mut(), &arrays)?;

    Ok(())
}

fn outfile(outdir: &str, name: &str) -> String {
    Path::new(outdir).join(name).display().to_string()
}

fn write_empty_matches(outdir: &str) -> anyhow::Result<()> {
    let mut writer = sruscan::writer(&outfile(outdir, "matches.tab"));
    report::write_matches(writer.as_mut(), &[])?;
    Ok(())
}

fn write_empty_reports(outdir: &str) -> anyhow::Result<()> {
    let mut writer = sruscan::writer(&outfile(outdir, "sru.tab"));
    report::write_srus(writer.as_mut(), &[])?;

    let mut writer = sruscan::writer(&outfile(outdir, "arrays.tab"));
    report::write_arrays(writer.as_mut(), &[])?;

    let mut writer = sruscan::writer(&outfile(outdir, "spacers.fa"));
    report::write_spacers(writer.as_mut(), &[])?;

    Ok(())
}
