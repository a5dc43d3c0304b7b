//! Reading the documents to flatten.
//!
//! Inputs are JSON arrays of objects, usually API dumps that can run into
//! hundreds of megabytes, so the SIMD parser is tried first. When it rejects
//! the input, serde_json re-parses it to produce an error with a position.

use crate::error::FlattenError;
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;

/// Read a JSON array of documents from any reader
pub fn read_documents<R: Read>(mut reader: R) -> Result<Vec<Value>, FlattenError> {
    let mut content = Vec::new();
    reader.read_to_end(&mut content)?;
    parse_documents(content)
}

/// Read a JSON array of documents from a file
pub fn read_documents_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Value>, FlattenError> {
    let file = std::fs::File::open(path.as_ref())?;
    read_documents(std::io::BufReader::new(file))
}

fn parse_documents(mut content: Vec<u8>) -> Result<Vec<Value>, FlattenError> {
    // simd-json parses in place, so keep a copy for the fallback
    let original = content.clone();

    let value: Value = match simd_json::serde::from_slice(&mut content) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("simd-json rejected input ({e}), retrying with serde_json");
            serde_json::from_slice(&original)?
        }
    };

    match value {
        Value::Array(documents) => Ok(documents),
        other => Err(FlattenError::NotAnArray(json_kind(&other))),
    }
}

/// Parse the `--additional-data` argument: it must be a JSON object
pub fn parse_additional_data(text: &str) -> Result<Map<String, Value>, FlattenError> {
    match serde_json::from_str(text)? {
        Value::Object(map) => Ok(map),
        other => Err(FlattenError::AdditionalDataNotObject(json_kind(&other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
