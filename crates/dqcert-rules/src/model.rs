use std::collections::BTreeMap;

use dqcert_core::{FormatKind, RuleSet};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Top-level keys understood by the rule document, aliases included.
pub const KNOWN_KEYS: &[&str] = &[
    "pk",
    "primaryKey",
    "primary_key",
    "required",
    "requiredColumns",
    "required_columns",
    "required_missing_threshold_pct",
    "requiredMissingThresholdPct",
    "timestamp_column",
    "timestampColumn",
    "freshness_days",
    "freshnessDays",
    "formats",
];

/// Certification rules as written on disk (`*.rules.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RuleDocument {
    /// Primary-key column. A list is accepted; only its first entry is used.
    #[serde(
        default,
        alias = "primaryKey",
        alias = "primary_key",
        skip_serializing_if = "Option::is_none"
    )]
    pub pk: Option<OneOrMany>,
    /// Columns that must be filled on every row.
    #[serde(
        default,
        alias = "requiredColumns",
        alias = "required_columns",
        skip_serializing_if = "Option::is_none"
    )]
    pub required: Option<OneOrMany>,
    /// Percentage (0–100) of rows allowed to miss a required column.
    #[serde(
        default,
        alias = "requiredMissingThresholdPct",
        skip_serializing_if = "Option::is_none"
    )]
    pub required_missing_threshold_pct: Option<f64>,
    /// Column holding record timestamps for the freshness check.
    #[serde(
        default,
        alias = "timestampColumn",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp_column: Option<String>,
    /// Maximum allowed age in days of the newest timestamp.
    #[serde(default, alias = "freshnessDays", skip_serializing_if = "Option::is_none")]
    pub freshness_days: Option<u32>,
    /// Format label (`email`, `phone`) to column name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formats: Option<BTreeMap<String, Option<String>>>,
}

/// A single column name or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn as_slice(&self) -> &[String] {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value),
            OneOrMany::Many(values) => values,
        }
    }
}

impl RuleDocument {
    /// Convert into the typed rule set. Assumes the document has been
    /// validated; unknown format labels and null entries are dropped.
    pub fn to_rule_set(&self) -> RuleSet {
        let primary_key = self
            .pk
            .as_ref()
            .and_then(|pk| pk.as_slice().first().cloned());
        let required_columns = self
            .required
            .as_ref()
            .map(|required| required.as_slice().iter().cloned().collect())
            .unwrap_or_default();

        let formats = self
            .formats
            .iter()
            .flatten()
            .filter_map(|(label, column)| {
                let kind = FormatKind::from_label(label)?;
                let column = column.as_ref()?;
                Some((kind, column.clone()))
            })
            .collect();

        RuleSet {
            primary_key,
            required_columns,
            required_missing_threshold_pct: self.required_missing_threshold_pct.unwrap_or(0.0),
            timestamp_column: self.timestamp_column.clone(),
            freshness_days: self.freshness_days.unwrap_or(0),
            formats,
        }
    }
}
