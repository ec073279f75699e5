use std::path::Path;

use dqcert_core::{FormatKind, RuleSet};
use jsonschema::JSONSchema;
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::{RuleError, ValidationIssue, ValidationReport};
use crate::model::{KNOWN_KEYS, OneOrMany, RuleDocument};
use crate::schema::rules_json_schema;

/// Validated rule set with accumulated warnings.
#[derive(Debug, Clone)]
pub struct ValidatedRules {
    pub rules: RuleSet,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate a rule JSON document against the rule JSON Schema.
pub fn validate_rules_json(
    rules_json: &Value,
    rules_schema: &Value,
) -> Result<ValidationReport, RuleError> {
    let compiled =
        JSONSchema::compile(rules_schema).map_err(|err| RuleError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(rules_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push(ValidationIssue::error(
                "schema_violation",
                path,
                error.to_string(),
            ));
        }
    }

    Ok(report)
}

/// Semantic checks on a structurally valid document.
///
/// `raw` is the document as written; it is used to report issues under the
/// key spelling the author chose and to spot unknown keys.
pub fn validate_rules_semantics(
    document: &RuleDocument,
    raw: &Map<String, Value>,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    for key in raw.keys() {
        if !KNOWN_KEYS.contains(&key.as_str()) {
            report.push(
                ValidationIssue::warning(
                    "unknown_key",
                    format!("/{key}"),
                    format!("key '{key}' is not a rule and will be ignored"),
                )
                .with_hint(format!("known keys: {}", KNOWN_KEYS.join(", "))),
            );
        }
    }

    if let Some(threshold) = document.required_missing_threshold_pct {
        if !threshold.is_finite() || !(0.0..=100.0).contains(&threshold) {
            report.push(
                ValidationIssue::error(
                    "threshold_out_of_range",
                    key_path(
                        raw,
                        &["required_missing_threshold_pct", "requiredMissingThresholdPct"],
                    ),
                    format!("threshold {threshold} is outside 0-100"),
                )
                .with_hint("use a percentage between 0 and 100"),
            );
        }
    }

    let pk_path = key_path(raw, &["pk", "primaryKey", "primary_key"]);
    if let Some(pk) = &document.pk {
        check_names(pk, &pk_path, &mut report);
        match pk.as_slice() {
            [] => report.push(ValidationIssue::warning(
                "empty_primary_key",
                pk_path.clone(),
                "primary key list is empty; no key will be checked",
            )),
            [first, rest @ ..] if !rest.is_empty() => report.push(
                ValidationIssue::warning(
                    "composite_primary_key",
                    pk_path.clone(),
                    format!("only the first key column '{first}' is checked"),
                )
                .with_hint("composite keys are not supported"),
            ),
            _ => {}
        }
    }

    if let Some(required) = &document.required {
        let path = key_path(raw, &["required", "requiredColumns", "required_columns"]);
        check_names(required, &path, &mut report);
    }

    let ts_path = key_path(raw, &["timestamp_column", "timestampColumn"]);
    if let Some(column) = &document.timestamp_column {
        if column.trim().is_empty() {
            report.push(blank_name(&ts_path));
        }
    }

    let days = document.freshness_days.unwrap_or(0);
    match (&document.timestamp_column, days) {
        (None, days) if days > 0 => report.push(
            ValidationIssue::warning(
                "freshness_without_column",
                key_path(raw, &["freshness_days", "freshnessDays"]),
                "freshness_days is set but no timestamp_column is configured",
            )
            .with_hint("set timestamp_column to enable the freshness check"),
        ),
        (Some(_), 0) => report.push(
            ValidationIssue::warning(
                "column_without_freshness",
                ts_path,
                "timestamp_column is set but freshness_days is 0 or missing",
            )
            .with_hint("set freshness_days above 0 to enable the freshness check"),
        ),
        _ => {}
    }

    for (label, column) in document.formats.iter().flatten() {
        let path = format!("/formats/{label}");
        if FormatKind::from_label(label).is_none() {
            let known: Vec<&str> = FormatKind::ALL.iter().map(FormatKind::as_str).collect();
            report.push(
                ValidationIssue::warning(
                    "unknown_format",
                    path,
                    format!("format '{label}' is not supported and will be ignored"),
                )
                .with_hint(format!("supported formats: {}", known.join(", "))),
            );
            continue;
        }
        if column.as_deref().is_some_and(|name| name.trim().is_empty()) {
            report.push(blank_name(&path));
        }
    }

    report
}

/// Validate the rule document end-to-end, returning structured issues on failure.
pub fn validate_rules(rules_json: &Value) -> Result<ValidatedRules, ValidationReport> {
    let structural = serde_json::to_value(rules_json_schema())
        .map_err(RuleError::from)
        .and_then(|schema| validate_rules_json(rules_json, &schema));
    let structural = match structural {
        Ok(report) => report,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push(ValidationIssue::error(
                "schema_validation_error",
                "/",
                err.to_string(),
            ));
            return Err(report);
        }
    };

    if !structural.is_ok() {
        return Err(structural);
    }

    let Some(raw) = rules_json.as_object() else {
        let mut report = ValidationReport::default();
        report.push(ValidationIssue::error(
            "invalid_rules_json",
            "/",
            "rule document must be a JSON object",
        ));
        return Err(report);
    };

    let document: RuleDocument = match serde_json::from_value(rules_json.clone()) {
        Ok(document) => document,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push(ValidationIssue::error(
                "invalid_rules_json",
                "/",
                err.to_string(),
            ));
            return Err(report);
        }
    };

    let semantic = validate_rules_semantics(&document, raw);
    if !semantic.is_ok() {
        return Err(semantic);
    }

    Ok(ValidatedRules {
        rules: document.to_rule_set(),
        warnings: semantic.warnings,
    })
}

/// Parse and validate a rule document held in memory.
pub fn parse_rules_str(contents: &str) -> Result<ValidatedRules, RuleError> {
    let json: Value = serde_json::from_str(contents)?;
    validate_rules(&json).map_err(RuleError::Invalid)
}

/// Read, parse and validate a rule file.
pub fn load_rules_file(path: &Path) -> Result<ValidatedRules, RuleError> {
    let contents = std::fs::read_to_string(path).map_err(|source| RuleError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let validated = parse_rules_str(&contents)?;
    debug!(
        path = %path.display(),
        warnings = validated.warnings.len(),
        "rule file validated"
    );
    Ok(validated)
}

fn check_names(names: &OneOrMany, path: &str, report: &mut ValidationReport) {
    match names {
        OneOrMany::One(name) if name.trim().is_empty() => report.push(blank_name(path)),
        OneOrMany::Many(values) => {
            for (idx, name) in values.iter().enumerate() {
                if name.trim().is_empty() {
                    report.push(blank_name(&format!("{path}/{idx}")));
                }
            }
        }
        OneOrMany::One(_) => {}
    }
}

fn blank_name(path: &str) -> ValidationIssue {
    ValidationIssue::error("blank_column_name", path, "column name must not be blank")
}

fn key_path(raw: &Map<String, Value>, names: &[&str]) -> String {
    let key = names
        .iter()
        .find(|name| raw.contains_key(**name))
        .or_else(|| names.first())
        .copied()
        .unwrap_or_default();
    format!("/{key}")
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}
