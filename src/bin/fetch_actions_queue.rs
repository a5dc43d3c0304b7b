//! fetch-actions-queue: Sample queued and in-progress workflow runs
//!
//! For every repository in the matrix, writes one row to the statistics CSV
//! and one raw snapshot under `<output-dir>/<owner>/<repo>/`.
//!
//! Usage:
//!   GITHUB_TOKEN=... fetch-actions-queue \
//!       --input matrix.json \
//!       --bq-output stats.csv \
//!       --output-dir stats

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use gha_stats::github::{GithubClient, GithubConfig, RepoMatrix};
use gha_stats::snapshot::write_snapshot;
use gha_stats::stats::{QueueStat, QueueStatWriter};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fetch-actions-queue")]
#[command(about = "Sample GitHub Actions queue sizes per repository", long_about = None)]
struct Args {
    /// JSON file with organisation and repositories
    #[arg(long)]
    input: PathBuf,

    /// Single CSV file for BigQuery
    #[arg(long)]
    bq_output: PathBuf,

    /// Directory for separate JSON snapshot files
    #[arg(long)]
    output_dir: PathBuf,

    /// API root, for GitHub Enterprise
    #[arg(long)]
    api_base: Option<String>,
}

fn main() -> Result<()> {
    gha_stats::logging::init();
    let args = Args::parse();

    let matrix = RepoMatrix::load(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let owner = matrix.owner()?;

    let mut config = GithubConfig::from_env()?;
    if let Some(base) = args.api_base {
        config.api_base = base;
    }
    let client = GithubClient::new(config)?;

    let mut writer = QueueStatWriter::create(&args.bq_output)
        .with_context(|| format!("Failed to create {}", args.bq_output.display()))?;

    println!("Fetching repos ({}) (queued, in_progress):", matrix.repository.len());
    for repo in &matrix.repository {
        let queue = client
            .fetch_repo_queue(owner, repo)
            .with_context(|| format!("Failed to fetch queue of {owner}/{repo}"))?;

        println!("{owner}/{repo}: {}, {}", queue.queued, queue.in_progress);
        writer.write(&QueueStat::from(&queue))?;

        let path = write_snapshot(&args.output_dir, &queue)
            .with_context(|| format!("Failed to write snapshot of {owner}/{repo}"))?;
        tracing::debug!(path = %path.display(), runs = queue.runs.len(), "wrote snapshot");
    }

    writer.flush()?;
    Ok(())
}
