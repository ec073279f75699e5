use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic label of a format-checked column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    Email,
    Phone,
}

impl FormatKind {
    pub const ALL: [FormatKind; 2] = [FormatKind::Email, FormatKind::Phone];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatKind::Email => "email",
            FormatKind::Phone => "phone",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == label)
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated certification criteria.
///
/// The default value is the empty rule set: no key, no required columns and
/// every optional check disabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub primary_key: Option<String>,
    pub required_columns: BTreeSet<String>,
    /// Share of rows (0–100) allowed to miss a required column.
    pub required_missing_threshold_pct: f64,
    pub timestamp_column: Option<String>,
    pub freshness_days: u32,
    pub formats: BTreeMap<FormatKind, String>,
}

impl RuleSet {
    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    pub fn with_required<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_columns
            .extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn with_required_threshold(mut self, pct: f64) -> Self {
        self.required_missing_threshold_pct = pct;
        self
    }

    pub fn with_freshness(mut self, column: impl Into<String>, days: u32) -> Self {
        self.timestamp_column = Some(column.into());
        self.freshness_days = days;
        self
    }

    pub fn with_format(mut self, kind: FormatKind, column: impl Into<String>) -> Self {
        self.formats.insert(kind, column.into());
        self
    }

    /// Columns that must exist for the rule set to apply: key, required
    /// columns and the timestamp column.
    pub fn referenced_columns(&self) -> BTreeSet<&str> {
        let mut columns: BTreeSet<&str> =
            self.required_columns.iter().map(String::as_str).collect();
        columns.extend(self.primary_key.as_deref());
        columns.extend(self.timestamp_column.as_deref());
        columns
    }

    pub fn freshness_enabled(&self) -> bool {
        self.timestamp_column.is_some() && self.freshness_days > 0
    }

    pub fn is_empty(&self) -> bool {
        self == &RuleSet::default()
    }
}
