use crate::error::FlattenError;
use crate::flatten::types::{FlatRow, HeaderPolicy};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::io::Write;

/// Writes flattened rows as CSV, merging constant extra columns into each row
pub struct CsvRowWriter<W: Write> {
    writer: csv::Writer<W>,
    policy: HeaderPolicy,
    additional: Map<String, Value>,
}

impl<W: Write> CsvRowWriter<W> {
    pub fn new(writer: W) -> Self {
        CsvRowWriter {
            writer: csv::Writer::from_writer(writer),
            policy: HeaderPolicy::default(),
            additional: Map::new(),
        }
    }

    pub fn with_policy(mut self, policy: HeaderPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Extra key/value pairs appended to every row. These win over a
    /// same-named key in the row itself.
    pub fn with_additional_data(mut self, additional: Map<String, Value>) -> Self {
        self.additional = additional;
        self
    }

    /// Write the header line and every row.
    ///
    /// Returns the header that was written.
    pub fn write_rows(&mut self, rows: &[FlatRow]) -> Result<Vec<String>, FlattenError> {
        let header = header_for(rows, &self.additional, self.policy)?;
        self.writer.write_record(&header)?;

        for row in rows {
            let record = header.iter().map(|column| {
                self.additional
                    .get(column)
                    .or_else(|| row.get(column))
                    .map(cell_text)
                    .unwrap_or_default()
            });
            self.writer.write_record(record)?;
        }

        tracing::debug!(rows = rows.len(), columns = header.len(), "wrote csv rows");
        Ok(header)
    }

    pub fn flush(&mut self) -> Result<(), FlattenError> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W, FlattenError> {
        self.writer
            .into_inner()
            .map_err(|e| FlattenError::Io(e.into_error()))
    }
}

/// Compute the column order for a set of rows.
///
/// With [`HeaderPolicy::FirstRow`] only the first row's keys are used, so a
/// key that first appears in a later row never reaches the output.
///
/// Additional-data keys always follow the row keys, even when a row key has
/// the same name. Both columns then carry the additional value.
pub fn header_for(
    rows: &[FlatRow],
    additional: &Map<String, Value>,
    policy: HeaderPolicy,
) -> Result<Vec<String>, FlattenError> {
    let first = rows.first().ok_or(FlattenError::NoRows)?;

    let mut header: Vec<String> = first.keys().cloned().collect();
    if policy == HeaderPolicy::Union {
        let mut seen: HashSet<&str> = header.iter().map(String::as_str).collect();
        let mut late = Vec::new();
        for row in &rows[1..] {
            for key in row.keys() {
                if seen.insert(key.as_str()) {
                    late.push(key.clone());
                }
            }
        }
        header.extend(late);
    }

    header.extend(additional.keys().cloned());
    Ok(header)
}

/// Render one value as a CSV cell
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        // Only opaque subtrees reach here; keep them as compact JSON
        other => other.to_string(),
    }
}
