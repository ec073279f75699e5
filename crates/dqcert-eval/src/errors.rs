use dqcert_ingest::IngestError;
use thiserror::Error;

/// Errors emitted by the evaluation engine.
///
/// A failing certification is not an error; it is a `FAIL` grade.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("could not open or decode file: {0}")]
    Ingestion(#[from] IngestError),
    #[error("file contains no rows: {0}")]
    EmptyDataset(String),
    #[error("evaluation cancelled")]
    Cancelled,
}
