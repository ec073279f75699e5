use std::collections::BTreeMap;

use dqcert_core::ColumnKind;

/// Options that control how a tabular file is loaded.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Parse at most this many data rows (peek read).
    pub row_limit: Option<usize>,
    /// Explicit kinds that override inference, keyed by column name.
    pub column_kinds: BTreeMap<String, ColumnKind>,
}

impl LoadOptions {
    /// Options for a cheap header/column peek.
    pub fn peek(rows: usize) -> Self {
        Self {
            row_limit: Some(rows),
            ..Self::default()
        }
    }
}
