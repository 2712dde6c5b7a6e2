use log::{info, warn};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use greedy_olc::export::{
    input_stem, prepare_run_dir, write_contigs_fasta, write_contigs_fasta_file, write_merge_log,
};
use greedy_olc::{
    read_sequences, run_batch, AssemblyConfig, BatchOutcome, ScorerKind, SnapshotFormat,
    SnapshotWriter, TieBreak,
};

/// Greedy overlap-layout-consensus assembler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Reads file: one read per line, FASTA or FASTQ (optionally gzipped)
    reads: PathBuf,

    /// JSON configuration file; flags given on the command line override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum overlap length for an edge to be created
    #[arg(long)]
    min_weight: Option<usize>,

    /// Overlap scoring rule
    #[arg(long, value_enum)]
    scorer: Option<ScorerKind>,

    /// Canonicalise read strands before building the graph
    #[arg(long, overrides_with = "no_strand_resolution")]
    strand_resolution: bool,

    /// Keep reads as given even if the configuration file enables strand resolution
    #[arg(long, overrides_with = "strand_resolution")]
    no_strand_resolution: bool,

    /// Choice among equally heavy edges
    #[arg(long, value_enum)]
    tie_break: Option<TieBreak>,

    /// Number of independent assembly runs
    #[arg(long)]
    iterations: Option<usize>,

    /// Base seed; run i uses seed + i
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads for batch runs (default: max available - 1)
    #[arg(long)]
    threads: Option<usize>,

    /// Root folder for per-run logs and snapshots
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Graph snapshot format written per contraction step (requires --log-dir)
    #[arg(long, value_enum, default_value_t = SnapshotFormat::None)]
    snapshots: SnapshotFormat,

    /// Write the best run's contigs here instead of stdout
    #[arg(long)]
    output_fasta: Option<PathBuf>,

    /// Wrap FASTA lines to this width (0 = no-wrap)
    #[arg(long, default_value_t = 60)]
    fasta_line_width: usize,

    /// Verbose/info output (default: quiet)
    #[arg(long, short = 'v', alias = "info")]
    verbose: bool,

    /// Debug output
    #[arg(long)]
    debug: bool,

    /// Trace output
    #[arg(long)]
    trace: bool,
}

fn main() {
    let args = Args::parse();
    let log_level = if args.trace {
        log::LevelFilter::Trace
    } else if args.debug {
        log::LevelFilter::Debug
    } else if args.verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Error
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .init();

    if let Err(error) = run_pipeline(&args) {
        eprintln!("Assembly failed: {error:?}");
        std::process::exit(1);
    }
}

fn default_threads() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

fn build_config(args: &Args) -> Result<AssemblyConfig> {
    let base = AssemblyConfig {
        threads: default_threads(),
        ..AssemblyConfig::default()
    };
    let mut config = match &args.config {
        Some(path) => AssemblyConfig::from_json_file_over(path, base)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => base,
    };

    if let Some(min_weight) = args.min_weight {
        config.min_weight = min_weight;
    }
    if let Some(scorer) = args.scorer {
        config.scorer = scorer;
    }
    if args.strand_resolution {
        config.strand_resolution = true;
    }
    if args.no_strand_resolution {
        config.strand_resolution = false;
    }
    if let Some(tie_break) = args.tie_break {
        config.tie_break = tie_break;
    }
    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    config.validate()?;
    Ok(config)
}

fn write_run_logs(outcome: &BatchOutcome, run_dirs: &[PathBuf], stem: &str) -> Result<()> {
    for (run, dir) in outcome.runs.iter().zip(run_dirs) {
        write_merge_log(&run.merge_log, &dir.join(format!("{stem}_sequences.txt")))?;
        write_contigs_fasta_file(&run.contigs, "contig", 0, &dir.join("contigs.fasta"))?;
    }
    Ok(())
}

fn run_pipeline(args: &Args) -> Result<BatchOutcome> {
    let config = build_config(args)?;
    let reads = read_sequences(&args.reads)
        .with_context(|| format!("Failed to parse reads from {}", args.reads.display()))?;
    info!("reads: {} ({} sequences)", args.reads.display(), reads.len());
    info!("variant: {}", config.variant_name());

    let run_dirs = match &args.log_dir {
        Some(root) => (0..config.iterations)
            .map(|_| prepare_run_dir(root, &args.reads, config.variant_name()))
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to prepare run folders under {}", root.display()))?,
        None => {
            if args.snapshots != SnapshotFormat::None {
                warn!("--snapshots has no effect without --log-dir");
            }
            Vec::new()
        }
    };

    let outcome = run_batch(&reads, &config, |run| match run_dirs.get(run) {
        Some(dir) => SnapshotWriter::new(dir.clone(), args.snapshots),
        None => SnapshotWriter::disabled(),
    })?;

    let stem = input_stem(&args.reads);
    write_run_logs(&outcome, &run_dirs, &stem)?;

    let Some(best_index) = outcome.best_index() else {
        return Ok(outcome);
    };
    let best = &outcome.runs[best_index];
    info!(
        "Best run {} of {}: {} contig(s) from {} reads (seed {})",
        best_index,
        outcome.runs.len(),
        best.contig_count(),
        best.read_count,
        greedy_olc::run_seed(outcome.base_seed, best_index)
    );

    let header = format!("{stem}_contig");
    match &args.output_fasta {
        Some(path) => {
            write_contigs_fasta_file(&best.contigs, &header, args.fasta_line_width, path)?;
            info!("Contigs written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            write_contigs_fasta(&mut out, &best.contigs, &header, args.fasta_line_width)?;
            out.flush()?;
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod smoke {
    use super::*;
    use std::path::Path;

    fn args_for(reads: &Path, extra: &[&str]) -> Args {
        let mut argv = vec!["greedy-olc".to_string(), reads.display().to_string()];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Args::parse_from(argv)
    }

    #[test]
    fn smoke_run() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let reads = dir.path().join("frag.dat");
        std::fs::write(&reads, "AAGA\nGATC\n").unwrap();
        let out = dir.path().join("out.fasta");

        let args = args_for(
            &reads,
            &["--output-fasta", out.to_str().unwrap(), "--threads", "1"],
        );
        let outcome = run_pipeline(&args).unwrap();
        assert_eq!(outcome.runs[0].contigs, vec!["AAGATC".to_string()]);
        let fasta = std::fs::read_to_string(&out).unwrap();
        assert!(fasta.contains("AAGATC"));
    }

    #[test]
    fn writes_run_folders_and_snapshots() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let reads = dir.path().join("frag.dat");
        std::fs::write(&reads, "AAGA\nGATC\n").unwrap();
        let logs = dir.path().join("logs");
        let out = dir.path().join("out.fasta");

        let args = args_for(
            &reads,
            &[
                "--log-dir",
                logs.to_str().unwrap(),
                "--snapshots",
                "gfa",
                "--iterations",
                "2",
                "--seed",
                "5",
                "--threads",
                "1",
                "--output-fasta",
                out.to_str().unwrap(),
            ],
        );
        run_pipeline(&args).unwrap();

        let variant_dir = logs.join("frag").join("core");
        let runs: Vec<_> = std::fs::read_dir(&variant_dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(runs.len(), 2);
        for run in runs {
            assert!(run.join("frag_sequences.txt").is_file());
            assert!(run.join("contigs.fasta").is_file());
            assert!(run.join("step_0.gfa").is_file());
            assert!(run.join("step_1.gfa").is_file());
        }
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{"min_weight": 4, "iterations": 3}"#).unwrap();

        let args = args_for(
            Path::new("reads.dat"),
            &[
                "--config",
                config_path.to_str().unwrap(),
                "--min-weight",
                "2",
                "--scorer",
                "substitution",
            ],
        );
        let config = build_config(&args).unwrap();
        assert_eq!(config.min_weight, 2);
        assert_eq!(config.iterations, 3);
        assert_eq!(config.scorer, ScorerKind::Substitution);
        assert_eq!(config.threads, default_threads());
    }

    #[test]
    fn config_file_threads_and_strand_flag_can_be_overridden() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{"strand_resolution": true, "threads": 3}"#).unwrap();
        let config_arg = config_path.to_str().unwrap();

        let from_file = build_config(&args_for(
            Path::new("reads.dat"),
            &["--config", config_arg],
        ))
        .unwrap();
        assert!(from_file.strand_resolution);
        assert_eq!(from_file.threads, 3);

        let switched_off = build_config(&args_for(
            Path::new("reads.dat"),
            &["--config", config_arg, "--no-strand-resolution"],
        ))
        .unwrap();
        assert!(!switched_off.strand_resolution);

        let last_wins = build_config(&args_for(
            Path::new("reads.dat"),
            &["--no-strand-resolution", "--strand-resolution"],
        ))
        .unwrap();
        assert!(last_wins.strand_resolution);
    }
}
