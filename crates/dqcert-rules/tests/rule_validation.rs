use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use dqcert_core::FormatKind;
use dqcert_rules::{
    RuleError, load_rules_for, parse_rules_str, rules_json_schema, validate_rules,
    validate_rules_json,
};
use serde_json::json;

fn temp_dir(label: &str) -> Result<PathBuf> {
    let mut dir = std::env::temp_dir();
    dir.push(format!("dqcert_rules_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).context("create temp dir")?;
    Ok(dir)
}

#[test]
fn full_document_becomes_rule_set() -> Result<()> {
    let validated = parse_rules_str(
        r#"{
            "pk": "id",
            "required": ["email", "name"],
            "required_missing_threshold_pct": 5,
            "timestamp_column": "updated_at",
            "freshness_days": 30,
            "formats": {"email": "email", "phone": "tel"}
        }"#,
    )?;

    let rules = validated.rules;
    assert_eq!(rules.primary_key.as_deref(), Some("id"));
    assert_eq!(
        rules.required_columns.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["email", "name"]
    );
    assert_eq!(rules.required_missing_threshold_pct, 5.0);
    assert_eq!(rules.timestamp_column.as_deref(), Some("updated_at"));
    assert_eq!(rules.freshness_days, 30);
    assert_eq!(rules.formats.get(&FormatKind::Phone).map(String::as_str), Some("tel"));
    assert!(validated.warnings.is_empty(), "unexpected warnings: {:?}", validated.warnings);
    Ok(())
}

#[test]
fn camel_case_aliases_are_accepted() -> Result<()> {
    let validated = parse_rules_str(
        r#"{"primaryKey": ["order_id", "line"], "requiredColumns": "sku",
            "timestampColumn": "ts", "freshnessDays": 7}"#,
    )?;

    assert_eq!(validated.rules.primary_key.as_deref(), Some("order_id"));
    assert!(validated.rules.required_columns.contains("sku"));
    assert!(validated.rules.freshness_enabled());
    let codes: Vec<&str> = validated.warnings.iter().map(|w| w.code.as_str()).collect();
    assert_eq!(codes, vec!["composite_primary_key"]);
    assert_eq!(validated.warnings[0].path, "/primaryKey");
    Ok(())
}

#[test]
fn empty_document_is_empty_rule_set() -> Result<()> {
    let validated = parse_rules_str("{}")?;
    assert!(validated.rules.is_empty());
    Ok(())
}

#[test]
fn structural_errors_are_reported_with_pointer() -> Result<()> {
    let schema = serde_json::to_value(rules_json_schema())?;
    let report = validate_rules_json(&json!({"freshness_days": "soon"}), &schema)?;
    assert!(!report.is_ok());
    assert_eq!(report.errors[0].code, "schema_violation");
    assert_eq!(report.errors[0].path, "/freshness_days");

    let report = validate_rules_json(&json!(["pk"]), &schema)?;
    assert!(!report.is_ok());
    Ok(())
}

#[test]
fn semantic_warnings_do_not_block() -> Result<()> {
    let validated = validate_rules(&json!({
        "pk": "id",
        "freshness_days": 10,
        "formats": {"zip": "postcode"},
        "owner": "ops"
    }))
    .map_err(|report| anyhow::anyhow!("{report}"))?;

    let mut codes: Vec<&str> = validated.warnings.iter().map(|w| w.code.as_str()).collect();
    codes.sort_unstable();
    assert_eq!(
        codes,
        vec!["freshness_without_column", "unknown_format", "unknown_key"]
    );
    assert!(validated.rules.formats.is_empty());
    assert!(!validated.rules.freshness_enabled());
    Ok(())
}

#[test]
fn blank_names_and_bad_threshold_are_errors() {
    let report = validate_rules(&json!({
        "pk": "",
        "required_missing_threshold_pct": -1
    }))
    .expect_err("invalid document");

    let mut codes: Vec<&str> = report.errors.iter().map(|e| e.code.as_str()).collect();
    codes.sort_unstable();
    assert_eq!(codes, vec!["blank_column_name", "threshold_out_of_range"]);
}

#[test]
fn malformed_json_is_a_json_error() {
    let err = parse_rules_str("{pk: id").expect_err("not json");
    assert!(matches!(err, RuleError::Json(_)));
}

#[test]
fn discovery_prefers_stem_specific_file() -> Result<()> {
    let dir = temp_dir("discover")?;
    let data = dir.join("customers.csv");
    fs::write(&data, "id\n1\n")?;
    fs::write(dir.join("rules.json"), r#"{"pk": "shared"}"#)?;
    fs::write(dir.join("customers.dq.json"), r#"{"pk": "id"}"#)?;

    let discovered = load_rules_for(&data)?;
    assert_eq!(discovered.path, Some(dir.join("customers.dq.json")));
    assert_eq!(discovered.rules.primary_key.as_deref(), Some("id"));
    Ok(())
}

#[test]
fn discovery_without_candidates_yields_empty_rules() -> Result<()> {
    let dir = temp_dir("none")?;
    let discovered = load_rules_for(&dir.join("orders.csv"))?;
    assert!(discovered.path.is_none());
    assert!(discovered.rules.is_empty());
    Ok(())
}

#[test]
fn invalid_discovered_file_is_an_error() -> Result<()> {
    let dir = temp_dir("invalid")?;
    fs::write(dir.join("dq_rules.json"), r#"{"required_missing_threshold_pct": 250}"#)?;

    match load_rules_for(&dir.join("orders.csv")) {
        Err(RuleError::Invalid(report)) => {
            assert_eq!(report.errors[0].code, "threshold_out_of_range");
            Ok(())
        }
        other => bail!("expected invalid rules, got {other:?}"),
    }
}
