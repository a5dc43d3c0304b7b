use serde_json::{Map, Value};

/// One flattened document: dotted path -> leaf value, in traversal order
pub type FlatRow = Map<String, Value>;

/// Path that is stored verbatim instead of being flattened.
///
/// Pull request lists on workflow runs vary in length from run to run and
/// would otherwise produce a different column set per document.
pub const PULL_REQUESTS_PATH: &str = "pull_requests";

/// Configuration for the flattening process
#[derive(Debug, Clone)]
pub struct FlattenConfig {
    /// Separator placed between path segments, e.g. "a.b.0"
    pub separator: String,

    /// Exact full paths whose value is stored as-is (not recursed into)
    pub opaque_paths: Vec<String>,

    /// Rewrite literal newlines and carriage returns in strings as `\n` / `\r`
    pub escape_line_breaks: bool,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        FlattenConfig {
            separator: String::from("."),
            opaque_paths: vec![String::from(PULL_REQUESTS_PATH)],
            escape_line_breaks: true,
        }
    }
}

impl FlattenConfig {
    pub fn with_opaque_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        if !self.opaque_paths.contains(&path) {
            self.opaque_paths.push(path);
        }
        self
    }

    pub(crate) fn is_opaque(&self, path: &str) -> bool {
        self.opaque_paths.iter().any(|p| p == path)
    }
}

/// How the CSV header is derived from a set of rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderPolicy {
    /// Keys of the first row only. Keys that appear only in later rows are
    /// dropped from the output.
    #[default]
    FirstRow,
    /// Union of all rows' keys, in first-seen order
    Union,
}
