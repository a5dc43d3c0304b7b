//! json-to-csv: Flatten a JSON array of documents into a CSV file
//!
//! Usage:
//!   # One row per document, header from the first document
//!   json-to-csv -i runs.json -o runs.csv
//!
//!   # Add constant columns to every row
//!   json-to-csv -i runs.json -o runs.csv -a '{"organisation": "apache"}'
//!
//!   # Keep columns that only appear in later documents
//!   json-to-csv -i runs.json -o runs.csv --union-header

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use gha_stats::flatten::{parse_additional_data, FlattenConfig, HeaderPolicy};
use serde_json::Map;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "json-to-csv")]
#[command(about = "Flatten a JSON array of documents into CSV", long_about = None)]
struct Args {
    /// Input file name (a JSON array of objects)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file name
    #[arg(short, long)]
    output: PathBuf,

    /// Additional data in form of a JSON object, added to every row
    #[arg(short, long = "additional_data", alias = "additional-data")]
    additional_data: Option<String>,

    /// Build the header from every row's keys instead of the first row only
    #[arg(long)]
    union_header: bool,

    /// Extra path to store verbatim instead of flattening (repeatable).
    /// `pull_requests` is always included.
    #[arg(long = "opaque-path", value_name = "PATH")]
    opaque_paths: Vec<String>,

    /// Separator between path segments (default: ".")
    #[arg(long)]
    separator: Option<String>,
}

fn main() -> Result<()> {
    gha_stats::logging::init();
    let args = Args::parse();

    // Build config
    let mut config = FlattenConfig::default();
    if let Some(sep) = args.separator {
        config.separator = sep;
    }
    for path in args.opaque_paths {
        config = config.with_opaque_path(path);
    }

    let additional = match &args.additional_data {
        Some(text) => parse_additional_data(text).context("Invalid --additional_data")?,
        None => Map::new(),
    };

    let policy = if args.union_header {
        HeaderPolicy::Union
    } else {
        HeaderPolicy::FirstRow
    };

    let rows = gha_stats::json_file_to_csv(&args.input, &args.output, config, policy, additional)
        .with_context(|| {
            format!(
                "Failed to convert {} to {}",
                args.input.display(),
                args.output.display()
            )
        })?;

    tracing::info!(rows, output = %args.output.display(), "wrote csv");
    Ok(())
}
