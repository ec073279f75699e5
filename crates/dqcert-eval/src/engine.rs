use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::{NaiveDateTime, Utc};
use dqcert_core::{RuleSet, Table, normalize_missing};
use dqcert_ingest::{LoadOptions, LoadedTable, SourceInfo};
use tracing::{debug, info};

use crate::errors::EvalError;
use crate::grading::{grade, reference_score, round2};
use crate::metrics::{
    FormatOutcome, FreshnessOutcome, PrimaryKeyOutcome, RESERVED_SCORE, RequiredOutcome,
    format_validity, freshness, primary_key_integrity, required_completeness, schema_conformity,
    schema_missing, value_completeness,
};
use crate::model::{
    EvaluateOptions, EvaluationResult, Findings, FreshnessStatus, HardFailFlags, Metric,
    MetricKind,
};
use crate::violations::{build_preview, violation_union};

/// Shared flag used to abandon a run before metrics are computed.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Certify tabular files against a rule set.
#[derive(Debug, Clone, Default)]
pub struct EvaluationEngine {
    options: EvaluateOptions,
}

impl EvaluationEngine {
    pub fn new(options: EvaluateOptions) -> Self {
        Self { options }
    }

    pub fn run(&self, path: &Path, rules: &RuleSet) -> Result<EvaluationResult, EvalError> {
        self.run_with_cancel(path, rules, &CancelToken::new())
    }

    /// Like [`run`](Self::run), but returns `Cancelled` when the token is
    /// tripped before metric computation starts.
    pub fn run_with_cancel(
        &self,
        path: &Path,
        rules: &RuleSet,
        cancel: &CancelToken,
    ) -> Result<EvaluationResult, EvalError> {
        let started = Instant::now();
        info!(path = %path.display(), "evaluation started");

        let loaded = dqcert_ingest::load(path, &LoadOptions::default())?;
        if cancel.is_cancelled() {
            info!(path = %path.display(), "evaluation cancelled");
            return Err(EvalError::Cancelled);
        }

        let result = self.evaluate_loaded(loaded, rules)?;
        info!(
            path = %path.display(),
            grade = %result.grade,
            reference_score = result.reference_score,
            duration_ms = started.elapsed().as_millis() as u64,
            "evaluation completed"
        );
        Ok(result)
    }

    /// Evaluate a table that was already loaded from a file.
    pub fn evaluate_loaded(
        &self,
        loaded: LoadedTable,
        rules: &RuleSet,
    ) -> Result<EvaluationResult, EvalError> {
        let LoadedTable { table, source } = loaded;
        if table.is_empty() {
            return Err(EvalError::EmptyDataset(source.path.display().to_string()));
        }
        info!(
            rows = table.row_count(),
            columns = table.column_count(),
            encoding = source.encoding.as_deref().unwrap_or("-"),
            "table loaded"
        );
        Ok(self.assess(normalize_missing(table), rules, Some(source)))
    }

    /// Run the pipeline on an in-memory table.
    pub fn evaluate_table(
        &self,
        table: Table,
        rules: &RuleSet,
    ) -> Result<EvaluationResult, EvalError> {
        if table.is_empty() {
            return Err(EvalError::EmptyDataset("in-memory table".to_string()));
        }
        Ok(self.assess(normalize_missing(table), rules, None))
    }

    fn assess(
        &self,
        table: Table,
        rules: &RuleSet,
        source: Option<SourceInfo>,
    ) -> EvaluationResult {
        let now = self
            .options
            .now
            .unwrap_or_else(|| Utc::now().naive_utc());

        let missing = schema_missing(&table, rules);
        let schema = schema_conformity(&missing);

        let (((completeness, absent_cells), required), ((pk, formats), fresh)) = rayon::join(
            || {
                rayon::join(
                    || value_completeness(&table),
                    || required_completeness(&table, rules),
                )
            },
            || {
                rayon::join(
                    || {
                        rayon::join(
                            || primary_key_integrity(&table, rules),
                            || format_validity(&table, rules),
                        )
                    },
                    || freshness(&table, rules, now),
                )
            },
        );

        let metrics: Vec<Metric> = [
            schema.score,
            completeness,
            required.outcome.score,
            pk.outcome.score,
            formats.outcome.score,
            fresh.outcome.score,
            RESERVED_SCORE,
        ]
        .into_iter()
        .zip(MetricKind::ALL)
        .map(|(score, kind)| Metric::new(kind, score))
        .collect();
        debug!(
            scores = ?metrics.iter().map(|metric| metric.score).collect::<Vec<_>>(),
            "metrics computed"
        );

        let hard_fails = HardFailFlags {
            schema: schema.hard_fail,
            required: required.outcome.hard_fail,
            primary_key: pk.outcome.hard_fail,
            freshness: fresh.outcome.hard_fail,
        };
        let grade = grade(&hard_fails, formats.outcome.score, completeness);

        let union = violation_union([
            &required.outcome.offending,
            &pk.outcome.offending,
            &formats.outcome.offending,
            &fresh.outcome.offending,
        ]);
        let violation_preview = build_preview(&table, &union, self.options.preview_limit);

        let notes = build_notes(&missing, rules, &required, &pk, &fresh);

        EvaluationResult {
            grade,
            reference_score: reference_score(&metrics),
            metrics,
            row_count: table.row_count(),
            column_count: table.column_count(),
            hard_fails,
            findings: build_findings(missing, absent_cells, required, pk, formats, fresh),
            violation_preview,
            notes,
            source,
        }
    }
}

fn build_findings(
    schema_missing: Vec<String>,
    absent_cells: usize,
    required: RequiredOutcome,
    pk: PrimaryKeyOutcome,
    formats: FormatOutcome,
    fresh: FreshnessOutcome,
) -> Findings {
    Findings {
        schema_missing,
        absent_cells,
        required_missing_rows: required.missing_rows,
        required_missing_pct: round2(required.missing_pct),
        pk_null: pk.null_rows,
        pk_duplicate: pk.duplicate_rows,
        formats: formats.columns,
        freshness: fresh.status,
    }
}

fn build_notes(
    schema_missing: &[String],
    rules: &RuleSet,
    required: &RequiredOutcome,
    pk: &PrimaryKeyOutcome,
    fresh: &FreshnessOutcome,
) -> Vec<String> {
    let mut notes = Vec::new();
    if !schema_missing.is_empty() {
        notes.push(format!("Missing columns: {}", schema_missing.join(", ")));
    }
    if !rules.required_columns.is_empty() {
        notes.push(format!(
            "Required missing rate: {:.2}% (threshold {:.0}%)",
            required.missing_pct, rules.required_missing_threshold_pct
        ));
    }
    match &rules.primary_key {
        Some(column) => notes.push(format!(
            "PK({column}) NULL={}, duplicate rows={}",
            pk.null_rows, pk.duplicate_rows
        )),
        None => notes.push("No primary key configured: score reduced (set a PK)".to_string()),
    }
    if let Some(message) = freshness_message(&fresh.status) {
        notes.push(format!("Freshness: {message}"));
    }
    notes
}

fn freshness_message(status: &FreshnessStatus) -> Option<String> {
    match status {
        FreshnessStatus::Unparsable { column } => {
            Some(format!("{column} could not be read as dates"))
        }
        FreshnessStatus::Stale {
            newest,
            age_days,
            allowed_days,
        } => Some(format!(
            "newest data ({}) exceeds the allowed {allowed_days} days: {age_days} days old",
            format_date(newest)
        )),
        FreshnessStatus::Skipped | FreshnessStatus::Fresh { .. } => None,
    }
}

fn format_date(value: &NaiveDateTime) -> String {
    value.date().format("%Y-%m-%d").to_string()
}
