use std::fmt;

use chrono::NaiveDateTime;
use dqcert_core::FormatKind;
use dqcert_ingest::SourceInfo;
use serde::{Deserialize, Serialize};

/// Default number of rows kept in the violation preview.
pub const DEFAULT_PREVIEW_LIMIT: usize = 50;

/// Options for a certification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateOptions {
    /// Maximum number of rows in the violation preview.
    pub preview_limit: usize,
    /// Evaluation clock for the freshness check; UTC wall clock when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now: Option<NaiveDateTime>,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        Self {
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            now: None,
        }
    }
}

/// Certification verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Grade {
    Pass,
    ConditionalPass,
    Fail,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Pass => "PASS",
            Grade::ConditionalPass => "CONDITIONAL_PASS",
            Grade::Fail => "FAIL",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The seven reported metrics, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    SchemaConformity,
    ValueCompleteness,
    RequiredCompleteness,
    PrimaryKeyIntegrity,
    FormatValidity,
    Freshness,
    Reserved,
}

impl MetricKind {
    pub const ALL: [MetricKind; 7] = [
        MetricKind::SchemaConformity,
        MetricKind::ValueCompleteness,
        MetricKind::RequiredCompleteness,
        MetricKind::PrimaryKeyIntegrity,
        MetricKind::FormatValidity,
        MetricKind::Freshness,
        MetricKind::Reserved,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::SchemaConformity => "Schema conformity",
            MetricKind::ValueCompleteness => "Value completeness",
            MetricKind::RequiredCompleteness => "Required completeness",
            MetricKind::PrimaryKeyIntegrity => "PK integrity",
            MetricKind::FormatValidity => "Format validity",
            MetricKind::Freshness => "Freshness",
            MetricKind::Reserved => "Reserved",
        }
    }
}

/// One named score in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub kind: MetricKind,
    pub label: String,
    pub score: f64,
}

impl Metric {
    pub fn new(kind: MetricKind, score: f64) -> Self {
        Self {
            kind,
            label: kind.label().to_string(),
            score,
        }
    }
}

/// Conditions that force a `FAIL` grade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardFailFlags {
    pub schema: bool,
    pub required: bool,
    pub primary_key: bool,
    pub freshness: bool,
}

impl HardFailFlags {
    pub fn any(&self) -> bool {
        self.schema || self.required || self.primary_key || self.freshness
    }

    /// Names of the raised flags, in a fixed order.
    pub fn raised(&self) -> Vec<&'static str> {
        [
            (self.schema, "schema"),
            (self.required, "required"),
            (self.primary_key, "primary_key"),
            (self.freshness, "freshness"),
        ]
        .into_iter()
        .filter_map(|(raised, name)| raised.then_some(name))
        .collect()
    }
}

/// Per-column outcome of a format check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatFinding {
    pub format: FormatKind,
    pub column: String,
    pub valid: usize,
    pub checked: usize,
}

impl FormatFinding {
    /// Fraction of checked values that matched; 1.0 when nothing was checked.
    pub fn ratio(&self) -> f64 {
        if self.checked == 0 {
            1.0
        } else {
            self.valid as f64 / self.checked as f64
        }
    }
}

/// Outcome of the freshness check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FreshnessStatus {
    /// Not configured, column missing, or allowance of zero days.
    Skipped,
    /// No cell of the timestamp column could be read as a timestamp.
    Unparsable { column: String },
    Fresh {
        newest: NaiveDateTime,
        age_days: i64,
        allowed_days: u32,
    },
    Stale {
        newest: NaiveDateTime,
        age_days: i64,
        allowed_days: u32,
    },
}

/// Raw counts behind the scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Findings {
    pub schema_missing: Vec<String>,
    pub absent_cells: usize,
    pub required_missing_rows: usize,
    pub required_missing_pct: f64,
    pub pk_null: usize,
    pub pk_duplicate: usize,
    pub formats: Vec<FormatFinding>,
    pub freshness: FreshnessStatus,
}

/// Rows implicated by failed or degraded metrics, rendered for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationPreview {
    /// 0-based row indices in ascending order.
    pub row_indices: Vec<usize>,
    pub columns: Vec<String>,
    /// Rendered cells per previewed row; `None` for absent cells.
    pub rows: Vec<Vec<Option<String>>>,
    /// Total number of offending rows before truncation.
    pub violation_count: usize,
}

/// Result of a certification run.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub grade: Grade,
    /// Unweighted mean of the seven scores; advisory only.
    pub reference_score: f64,
    pub metrics: Vec<Metric>,
    pub row_count: usize,
    pub column_count: usize,
    pub hard_fails: HardFailFlags,
    pub findings: Findings,
    pub violation_preview: ViolationPreview,
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceInfo>,
}

impl EvaluationResult {
    pub fn metric(&self, kind: MetricKind) -> Option<&Metric> {
        self.metrics.iter().find(|metric| metric.kind == kind)
    }

    pub fn score(&self, kind: MetricKind) -> f64 {
        self.metric(kind).map(|metric| metric.score).unwrap_or(0.0)
    }
}
