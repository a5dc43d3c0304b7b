//! parse-snapshots: Rebuild queue statistics from stored snapshots
//!
//! The first directory level under `--input-dir` is the owner. With one owner
//! the CSV goes to `--output`; with several, each owner gets
//! `<output>_<owner>`.
//!
//! Usage:
//!   parse-snapshots --input-dir gcs --output bq_csv.csv

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use gha_stats::snapshot::parse_snapshot_tree;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "parse-snapshots")]
#[command(about = "Rebuild queue statistics CSV from snapshot files", long_about = None)]
struct Args {
    /// Base directory laid out as <owner>/<repo>/<timestamp>.json
    #[arg(long)]
    input_dir: PathBuf,

    /// CSV output file
    #[arg(long)]
    output: PathBuf,
}

fn main() -> Result<()> {
    gha_stats::logging::init();
    let args = Args::parse();

    let results = parse_snapshot_tree(&args.input_dir, &args.output)
        .with_context(|| format!("Failed to parse {}", args.input_dir.display()))?;

    if results.is_empty() {
        eprintln!("Warning: no owner directories found in {}", args.input_dir.display());
    }

    for (owner, output, report) in &results {
        for stat in &report.stats {
            println!("{owner}/{}: {}, {}", stat.repository_name, stat.queued, stat.in_progress);
        }
        tracing::info!(owner = owner.as_str(), rows = report.written(), output = %output.display(), "finished owner");
        println!("Failed files {}:", report.failed.len());
        for file in &report.failed {
            println!("{}", file.display());
        }
    }

    Ok(())
}
