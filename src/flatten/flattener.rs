use crate::flatten::types::{FlatRow, FlattenConfig};
use serde_json::{Map, Value};

/// Reduces nested JSON documents to flat, single-level rows
pub struct Flattener {
    config: FlattenConfig,
}

impl Flattener {
    pub fn new(config: FlattenConfig) -> Self {
        Flattener { config }
    }

    pub fn config(&self) -> &FlattenConfig {
        &self.config
    }

    /// Flatten one JSON value into one row
    pub fn flatten(&self, value: Value) -> FlatRow {
        let mut row = Map::new();
        let mut prefix = String::new();
        self.walk(value, &mut prefix, &mut row);
        row
    }

    /// Flatten every document, preserving input order
    pub fn flatten_all(&self, documents: Vec<Value>) -> Vec<FlatRow> {
        documents.into_iter().map(|doc| self.flatten(doc)).collect()
    }

    /// Recursive walk. `prefix` always ends with the separator unless it is
    /// the empty root prefix.
    fn walk(&self, value: Value, prefix: &mut String, row: &mut FlatRow) {
        if self.config.is_opaque(self.key_for(prefix)) {
            row.insert(self.key_for(prefix).to_string(), value);
            return;
        }

        match value {
            Value::Object(obj) => {
                for (key, child) in obj {
                    let mark = prefix.len();
                    prefix.push_str(&key);
                    prefix.push_str(&self.config.separator);
                    self.walk(child, prefix, row);
                    prefix.truncate(mark);
                }
            }
            Value::Array(arr) => {
                for (idx, child) in arr.into_iter().enumerate() {
                    let mark = prefix.len();
                    prefix.push_str(&idx.to_string());
                    prefix.push_str(&self.config.separator);
                    self.walk(child, prefix, row);
                    prefix.truncate(mark);
                }
            }
            Value::String(s) if self.config.escape_line_breaks => {
                let escaped = s.replace('\n', "\\n").replace('\r', "\\r");
                row.insert(self.key_for(prefix).to_string(), Value::String(escaped));
            }
            leaf => {
                row.insert(self.key_for(prefix).to_string(), leaf);
            }
        }
    }

    /// The output key for a prefix: the prefix without its trailing separator
    fn key_for<'a>(&self, prefix: &'a str) -> &'a str {
        prefix
            .strip_suffix(self.config.separator.as_str())
            .unwrap_or(prefix)
    }
}

impl Default for Flattener {
    fn default() -> Self {
        Flattener::new(FlattenConfig::default())
    }
}
