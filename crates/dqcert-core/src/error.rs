use thiserror::Error;

/// Core error type shared across dqcert crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The table violates its structural invariants.
    #[error("invalid table: {0}")]
    InvalidTable(String),
}

/// Convenience alias for results returned by dqcert crates.
pub type Result<T> = std::result::Result<T, Error>;
