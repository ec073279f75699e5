use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a tabular file.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Every encoding and delimiter combination failed.
    #[error(
        "could not decode {path} with any supported encoding or delimiter; last error: {last_error}"
    )]
    Undecodable { path: PathBuf, last_error: String },
    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("workbook has no sheets: {0}")]
    NoSheets(PathBuf),
    #[error(transparent)]
    Table(#[from] dqcert_core::Error),
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
