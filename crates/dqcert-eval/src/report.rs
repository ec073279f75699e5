use crate::model::{EvaluationResult, FreshnessStatus, Grade};

/// Render a deterministic markdown report from an evaluation result.
pub fn render_report(result: &EvaluationResult) -> String {
    let mut lines = Vec::new();

    lines.push("# dqcert Certification Report".to_string());
    lines.push(String::new());
    lines.push("## Run summary".to_string());
    lines.push(format!("- grade: {}", result.grade));
    lines.push(format!(
        "- reference_score: {:.2} (advisory)",
        result.reference_score
    ));
    lines.push(format!("- rows: {}", result.row_count));
    lines.push(format!("- columns: {}", result.column_count));
    if let Some(source) = &result.source {
        lines.push(format!("- file: {}", source.path.display()));
        lines.push(format!("- format: {}", source.format.as_str()));
        if let Some(encoding) = &source.encoding {
            let lossy = if source.lossy_decoding { " (lossy)" } else { "" };
            lines.push(format!("- encoding: {encoding}{lossy}"));
        }
        if let Some(delimiter) = source.delimiter {
            lines.push(format!("- delimiter: {}", delimiter.escape_default()));
        }
        lines.push(format!("- sha256: {}", source.sha256));
    }
    lines.push(String::new());

    lines.push("## Metrics".to_string());
    lines.push("| metric | score |".to_string());
    lines.push("| --- | --- |".to_string());
    for metric in &result.metrics {
        lines.push(format!("| {} | {:.2} |", metric.label, metric.score));
    }
    lines.push(String::new());

    let raised = result.hard_fails.raised();
    if !raised.is_empty() {
        lines.push("## Hard fails".to_string());
        for name in raised {
            lines.push(format!("- {name}"));
        }
        lines.push(String::new());
    }

    if !result.findings.formats.is_empty() {
        lines.push("## Format checks".to_string());
        lines.push("| format | column | valid | checked |".to_string());
        lines.push("| --- | --- | --- | --- |".to_string());
        for finding in &result.findings.formats {
            lines.push(format!(
                "| {} | {} | {} | {} |",
                finding.format, finding.column, finding.valid, finding.checked
            ));
        }
        lines.push(String::new());
    }

    if !result.notes.is_empty() {
        lines.push("## Notes".to_string());
        for note in &result.notes {
            lines.push(format!("- {note}"));
        }
        lines.push(String::new());
    }

    let preview = &result.violation_preview;
    if preview.violation_count > 0 {
        lines.push(format!(
            "## Violation preview ({} of {} rows)",
            preview.row_indices.len(),
            preview.violation_count
        ));
    } else {
        lines.push("## Data preview".to_string());
    }
    let mut header = vec!["row".to_string()];
    header.extend(preview.columns.iter().map(|column| escape_cell(column)));
    lines.push(format!("| {} |", header.join(" | ")));
    lines.push(format!("|{}", " --- |".repeat(header.len())));
    for (row, cells) in preview.row_indices.iter().zip(&preview.rows) {
        let mut values = vec![row.to_string()];
        values.extend(
            cells
                .iter()
                .map(|cell| cell.as_deref().map(escape_cell).unwrap_or_default()),
        );
        lines.push(format!("| {} |", values.join(" | ")));
    }
    lines.push(String::new());

    lines.push("## Recommendations".to_string());
    lines.extend(recommendations(result));
    lines.join("\n")
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

fn recommendations(result: &EvaluationResult) -> Vec<String> {
    let mut lines = Vec::new();
    let findings = &result.findings;
    if result.hard_fails.schema {
        lines.push("- add the missing columns or fix their names in the rule file.".to_string());
    }
    if result.hard_fails.required {
        lines.push("- fill required columns or raise the missing-rate threshold.".to_string());
    }
    if findings.pk_null > 0 || findings.pk_duplicate > 0 {
        lines.push("- remove duplicate keys and fill empty key values.".to_string());
    }
    if matches!(findings.freshness, FreshnessStatus::Unparsable { .. }) {
        lines.push("- store the timestamp column in a date format such as YYYY-MM-DD.".to_string());
    } else if result.hard_fails.freshness {
        lines.push("- refresh the extract; the newest record is older than allowed.".to_string());
    }
    if result.grade == Grade::ConditionalPass {
        lines.push("- review format validity and empty cells before publishing.".to_string());
    }
    if result.grade == Grade::Pass {
        lines.push("- no issues detected; keep the rule file next to the data.".to_string());
    }
    lines
}
