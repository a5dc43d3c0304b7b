//! # gha-stats - GitHub Actions queue statistics
//!
//! Small tools for collecting CI queue numbers from the GitHub REST API and
//! turning JSON dumps into CSV for a warehouse.
//!
//! ## Modules
//!
//! - **flatten**: Flatten nested JSON documents into CSV rows
//! - **github**: Repository listing and workflow-queue sampling
//! - **snapshot**: Timestamped snapshot files and re-parsing them
//! - **stats**: The queue statistics CSV
//!
//! ## Quick Start
//!
//! ```rust
//! use gha_stats::flatten::Flattener;
//! use serde_json::json;
//!
//! let run = json!({
//!     "id": 1,
//!     "repository": {"name": "airflow", "owner": {"login": "apache"}},
//!     "pull_requests": [{"number": 7}]
//! });
//!
//! let row = Flattener::default().flatten(run);
//! assert_eq!(row["repository.owner.login"], "apache");
//! assert_eq!(row["pull_requests"], json!([{"number": 7}]));
//! ```

use serde_json::{Map, Value};
use std::path::Path;

pub mod error;
pub mod flatten;
pub mod github;
pub mod logging;
pub mod snapshot;
pub mod stats;

// Re-export commonly used types for convenience
pub use error::{FlattenError, GithubError, SnapshotError};
pub use flatten::{CsvRowWriter, FlatRow, FlattenConfig, Flattener, HeaderPolicy};
pub use github::{GithubClient, GithubConfig, RepoMatrix, RepoQueue};
pub use stats::{QueueStat, QueueStatWriter};

/// Main entry point: flatten a JSON array file into a CSV file.
///
/// Returns the number of rows written.
pub fn json_file_to_csv(
    input: &Path,
    output: &Path,
    config: FlattenConfig,
    policy: HeaderPolicy,
    additional: Map<String, Value>,
) -> Result<usize, FlattenError> {
    let documents = flatten::read_documents_from_path(input)?;
    let rows = Flattener::new(config).flatten_all(documents);

    let file = std::fs::File::create(output)?;
    let mut writer = CsvRowWriter::new(file)
        .with_policy(policy)
        .with_additional_data(additional);
    writer.write_rows(&rows)?;
    writer.flush()?;

    Ok(rows.len())
}
