//! Core contracts and helpers for dqcert.
//!
//! This crate defines the in-memory table, the validated rule set, the
//! missing-value normalizer, and the timestamp parser shared by the ingestion
//! adapter and the evaluation engine.

pub mod error;
pub mod normalize;
pub mod rules;
pub mod table;
pub mod temporal;

pub use error::{Error, Result};
pub use normalize::{MISSING_TOKENS, is_missing_token, normalize_missing};
pub use rules::{FormatKind, RuleSet};
pub use table::{Cell, Column, ColumnKind, Table};
pub use temporal::parse_timestamp;
