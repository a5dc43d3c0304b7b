use thiserror::Error;

/// Errors from reading, flattening and writing documents
#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array of documents, found {0}")]
    NotAnArray(&'static str),

    #[error("additional data must be a JSON object, found {0}")]
    AdditionalDataNotObject(&'static str),

    #[error("no rows to determine header from")]
    NoRows,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from talking to the GitHub REST API
#[derive(Debug, Error)]
pub enum GithubError {
    /// The rate limit is used up. Raised before any status check so the
    /// operator sees when the quota resets.
    #[error(
        "GitHub API quota exhausted{}: remaining={remaining}, limit={}, reset={}",
        while_fetching(.repo),
        or_unknown(.limit),
        or_unknown(.reset)
    )]
    QuotaExceeded {
        repo: Option<String>,
        limit: Option<u64>,
        remaining: u64,
        reset: Option<chrono::DateTime<chrono::Utc>>,
    },

    #[error("request to {url} failed with status {status}")]
    Status { status: u16, url: String, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn while_fetching(repo: &Option<String>) -> String {
    repo.as_deref()
        .map(|r| format!(" while fetching {r}"))
        .unwrap_or_default()
}

fn or_unknown<T: ToString>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "unknown".into())
}

/// Errors from writing or reading back queue snapshots
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot file name {0:?} does not match YYYYMMDD_HHMMSSZ.json")]
    BadFileName(String),

    #[error("snapshot {path} is not a JSON array of workflow runs")]
    NotAnArray { path: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
