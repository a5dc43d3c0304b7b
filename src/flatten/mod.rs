//! JSON flattening - turn nested JSON documents into flat CSV rows
//!
//! Each document becomes one row whose keys are dotted paths through the
//! original tree (`repository.owner.login`, `labels.0.name`). Rows are then
//! written as CSV with a header derived from the rows.

pub mod flattener;
pub mod input;
pub mod types;
pub mod writer;

pub use flattener::Flattener;
pub use input::{parse_additional_data, read_documents, read_documents_from_path};
pub use types::{FlatRow, FlattenConfig, HeaderPolicy, PULL_REQUESTS_PATH};
pub use writer::{cell_text, header_for, CsvRowWriter};
