use clap::*;
use cmd_lib::*;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("search")
        .about("BLAST a repeat database against a genome")
        .after_help(
            r###"
Wraps `makeblastdb` and `blastn` to produce the tabular match list consumed
by `sruscan cluster`.

The genome is formatted into a scratch BLAST database, then the repeat
database is searched against it with the short-sequence task:

    blastn -task blastn-short -outfmt 6

Both executables must be on PATH.

Examples:
1. Default word size:
   sruscan search genome.fa --db repeats.fa -o search.tab

2. More threads, larger word size:
   sruscan search genome.fa --db repeats.fa --threads 8 --word-size 11

"###,
        )
        .arg(
            Arg::new("genome")
                .required(true)
                .index(1)
                .help("Genome FASTA to search"),
        )
        .arg(
            Arg::new("db")
                .long("db")
                .short('d')
                .required(true)
                .num_args(1)
                .help("Repeat database FASTA, used as the query"),
        )
        .arg(
            Arg::new("word_size")
                .long("word-size")
                .value_parser(value_parser!(usize))
                .num_args(1)
                .default_value("7")
                .help("blastn word size"),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .value_parser(value_parser!(usize))
                .num_args(1)
                .default_value("4")
                .help("blastn worker threads"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("search.tab")
                .help("Output filename"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let genome = args.get_one::<String>("genome").unwrap();
    let db = args.get_one::<String>("db").unwrap();
    let word_size = *args.get_one::<usize>("word_size").unwrap();
    let threads = *args.get_one::<usize>("threads").unwrap();
    let outfile = args.get_one::<String>("outfile").unwrap();

    for exe in ["makeblastdb", "blastn"] {
        if which::which(exe).is_err() {
            anyhow::bail!("{} not found in PATH. Please install BLAST+ first.", exe);
        }
    }

    // scratch database, removed with the tempdir
    let tmp = tempfile::tempdir()?;
    let blast_db = tmp.path().join("genome").display().to_string();

    log::info!("Making BLAST database");
    run_cmd!(makeblastdb -dbtype nucl -in $genome -out $blast_db > /dev/null)?;

    log::info!("BLASTing repeats against {}", genome);
    run_cmd!(
        blastn -task blastn-short
            -word_size $word_size
            -query $db
            -db $blast_db
            -outfmt 6
            -out $outfile
            -num_threads $threads
    )?;

    Ok(())
}
