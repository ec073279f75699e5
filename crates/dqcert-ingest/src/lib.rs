//! Tabular file ingestion: delimited text of unknown encoding and delimiter,
//! and spreadsheet workbooks.

pub mod adapter;
mod columns;
pub mod delimited;
pub mod error;
pub mod options;
pub mod source;
pub mod spreadsheet;

pub use adapter::{TableSource, load, source_for};
pub use delimited::{DelimitedSource, TextEncoding, decode_table};
pub use error::IngestError;
pub use options::LoadOptions;
pub use source::{LoadedTable, SourceFormat, SourceInfo};
pub use spreadsheet::SpreadsheetSource;

pub use dqcert_core::Table;
