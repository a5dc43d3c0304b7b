//! fetch-org-repos: List an organisation's repositories that use GitHub Actions
//!
//! Writes the repository matrix consumed by fetch-actions-queue.
//!
//! Usage:
//!   GITHUB_TOKEN=... fetch-org-repos --org apache --output matrix.json

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use gha_stats::github::{GithubClient, GithubConfig, RepoMatrix};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fetch-org-repos")]
#[command(about = "List organisation repositories that use GitHub Actions", long_about = None)]
struct Args {
    /// GitHub organisation
    #[arg(long)]
    org: String,

    /// Output file
    #[arg(long)]
    output: PathBuf,

    /// API root, for GitHub Enterprise
    #[arg(long)]
    api_base: Option<String>,
}

fn main() -> Result<()> {
    gha_stats::logging::init();
    let args = Args::parse();

    let mut config = GithubConfig::from_env()?;
    if let Some(base) = args.api_base {
        config.api_base = base;
    }
    let client = GithubClient::new(config)?;

    let repos = client
        .list_org_repos(&args.org)
        .with_context(|| format!("Failed to list repositories of {}", args.org))?;
    let with_actions = client
        .repos_using_actions(&args.org, &repos)
        .context("Failed to check repositories for workflow runs")?;

    RepoMatrix::new(args.org, with_actions)
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    Ok(())
}
