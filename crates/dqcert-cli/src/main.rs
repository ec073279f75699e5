mod registry;
mod settings;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use dqcert_core::{ColumnKind, RuleSet};
use dqcert_eval::{
    CancelToken, DEFAULT_PREVIEW_LIMIT, EvalError, EvaluateOptions, EvaluationEngine,
    EvaluationResult, Grade, render_report,
};
use dqcert_ingest::{IngestError, LoadOptions};
use dqcert_rules::{
    RuleError, ValidationIssue, ValidationReport, load_rules_file, load_rules_for,
    rules_json_schema,
};
use registry::{RunContext, init_run_logging, start_run, write_report, write_result};
use settings::{SettingsError, load_settings};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("rules error: {0}")]
    Rules(#[from] RuleError),
    #[error("{0}")]
    Eval(#[from] EvalError),
    #[error("ingestion error: {0}")]
    Ingest(#[from] IngestError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("evaluation task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("certification failed for {0}")]
    CertificationFailed(String),
}

#[derive(Parser, Debug)]
#[command(name = "dqcert", version, about = "Tabular data-quality certification")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Certify a CSV or spreadsheet file against its rules.
    Certify(CertifyArgs),
    /// List the columns and inferred kinds of a file.
    Columns(ColumnsArgs),
    /// Validate a rule document.
    CheckRules(CheckRulesArgs),
    /// Print the JSON Schema of the rule document.
    RulesSchema,
}

#[derive(Args, Debug)]
struct CertifyArgs {
    /// Data file (.csv, .tsv, .txt, .xlsx, .xls, .ods, ...).
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// Rule file; discovered next to the data file when omitted.
    #[arg(long)]
    rules: Option<PathBuf>,
    /// Output directory for runs.
    #[arg(long)]
    run_dir: Option<PathBuf>,
    /// Maximum rows in the violation preview.
    #[arg(long, value_name = "N")]
    preview: Option<usize>,
    /// Exit with an error when the grade is FAIL.
    #[arg(long, default_value_t = false)]
    strict: bool,
    /// Settings file (defaults to ./dqcert.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ColumnsArgs {
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// Number of data rows read for kind inference.
    #[arg(long, value_name = "N", default_value_t = 200)]
    rows: usize,
    /// Force a column kind, e.g. `--kind zip=text`.
    #[arg(long = "kind", value_name = "COLUMN=KIND", value_parser = parse_kind_override)]
    kinds: Vec<(String, ColumnKind)>,
}

#[derive(Args, Debug)]
struct CheckRulesArgs {
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Certify(args) => run_certify(args).await,
        Command::Columns(args) => run_columns(args),
        Command::CheckRules(args) => run_check_rules(args),
        Command::RulesSchema => {
            let schema = rules_json_schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
    }
}

async fn run_certify(args: CertifyArgs) -> Result<(), CliError> {
    let CertifyArgs {
        file,
        rules,
        run_dir,
        preview,
        strict,
        config,
    } = args;

    let settings = load_settings(config.as_deref())?;
    let run_dir = run_dir
        .or(settings.run_dir)
        .unwrap_or_else(|| PathBuf::from("runs"));
    let preview_limit = preview
        .or(settings.preview_limit)
        .unwrap_or(DEFAULT_PREVIEW_LIMIT);
    let strict = strict || settings.strict.unwrap_or(false);

    let (rules_path, rule_set, warnings) = resolve_rules(&file, rules)?;
    let options = EvaluateOptions {
        preview_limit,
        now: None,
    };

    let run_id = Uuid::new_v4().to_string();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        run_dir,
        data_path: file.clone(),
        rules_path: rules_path.clone(),
        rules: rule_set.clone(),
        options: options.clone(),
        strict,
    };

    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path)?;

    let rules_label = rules_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    tracing::info!(
        event = "run_started",
        run_id = %run_id,
        file = %file.display(),
        rules = %rules_label
    );
    for warning in &warnings {
        tracing::warn!(
            event = "rule_warning",
            code = %warning.code,
            path = %warning.path,
            message = %warning.message
        );
    }
    if rule_set.is_empty() {
        tracing::warn!(event = "rules_empty", file = %file.display());
        eprintln!(
            "warning: no rules apply to {}; schema, required and freshness checks are skipped",
            file.display()
        );
    }

    let timer = Instant::now();
    let cancel = CancelToken::new();
    let engine = EvaluationEngine::new(options);
    let mut task = {
        let cancel = cancel.clone();
        let file = file.clone();
        tokio::task::spawn_blocking(move || engine.run_with_cancel(&file, &rule_set, &cancel))
    };

    let outcome = tokio::select! {
        joined = &mut task => joined?,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            tracing::warn!(event = "cancel_requested", run_id = %run_id);
            task.await?
        }
    };

    let result = match outcome {
        Ok(result) => result,
        Err(err) => {
            tracing::info!(
                event = "run_finished",
                status = "error",
                error = %err,
                duration_ms = timer.elapsed().as_millis() as u64
            );
            return Err(err.into());
        }
    };

    write_result(&run_paths, &result)?;
    tracing::info!(event = "result_written", path = %run_paths.result_path.display());
    write_report(&run_paths, &render_report(&result))?;
    tracing::info!(event = "report_written", path = %run_paths.report_path.display());

    tracing::info!(
        event = "run_finished",
        status = "success",
        grade = %result.grade,
        reference_score = result.reference_score,
        duration_ms = timer.elapsed().as_millis() as u64
    );

    print_summary(&result, &warnings, &run_paths.root);

    if strict && result.grade == Grade::Fail {
        return Err(CliError::CertificationFailed(file.display().to_string()));
    }
    Ok(())
}

fn resolve_rules(
    file: &Path,
    explicit: Option<PathBuf>,
) -> Result<(Option<PathBuf>, RuleSet, Vec<ValidationIssue>), CliError> {
    match explicit {
        Some(path) => {
            let validated = load_rules_file(&path)?;
            Ok((Some(path), validated.rules, validated.warnings))
        }
        None => {
            let discovered = load_rules_for(file)?;
            Ok((discovered.path, discovered.rules, discovered.warnings))
        }
    }
}

fn print_summary(result: &EvaluationResult, warnings: &[ValidationIssue], run_root: &Path) {
    println!("grade: {}", result.grade);
    println!("reference score: {:.2}", result.reference_score);
    println!("rows: {}  columns: {}", result.row_count, result.column_count);
    for metric in &result.metrics {
        println!("  {:<24}{:>7.2}", metric.label, metric.score);
    }
    for note in &result.notes {
        println!("note: {note}");
    }
    for warning in warnings {
        eprintln!("warning {} {}: {}", warning.code, warning.path, warning.message);
    }
    println!(
        "violations: {} (previewing {})",
        result.violation_preview.violation_count,
        result.violation_preview.row_indices.len()
    );
    println!("run: {}", run_root.display());
}

fn run_columns(args: ColumnsArgs) -> Result<(), CliError> {
    let mut options = LoadOptions::peek(args.rows);
    options.column_kinds.extend(args.kinds);

    let loaded = dqcert_ingest::load(&args.file, &options)?;
    let source = &loaded.source;
    let encoding = source.encoding.as_deref().unwrap_or("-");
    let delimiter = source
        .delimiter
        .map(|delimiter| delimiter.escape_default().to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "# {} format={} encoding={} delimiter={} rows_read={}",
        source.path.display(),
        source.format.as_str(),
        encoding,
        delimiter,
        loaded.table.row_count()
    );
    for column in loaded.table.columns() {
        println!("{}\t{}", column.name, column.kind);
    }
    Ok(())
}

fn run_check_rules(args: CheckRulesArgs) -> Result<(), CliError> {
    match load_rules_file(&args.file) {
        Ok(validated) => {
            if validated.warnings.is_empty() {
                println!("rules validated successfully");
            } else {
                eprintln!("rules validated with warnings:");
                print_report(&ValidationReport {
                    errors: Vec::new(),
                    warnings: validated.warnings,
                });
            }
            println!("{}", serde_json::to_string_pretty(&validated.rules)?);
            Ok(())
        }
        Err(RuleError::Invalid(report)) => {
            eprintln!("rule validation failed");
            print_report(&report);
            Err(RuleError::Invalid(report).into())
        }
        Err(err) => Err(err.into()),
    }
}

fn print_report(report: &ValidationReport) {
    for issue in &report.errors {
        eprintln!("error {} {}: {}", issue.code, issue.path, issue.message);
        if let Some(hint) = &issue.hint {
            eprintln!("  hint: {hint}");
        }
    }
    for issue in &report.warnings {
        eprintln!("warning {} {}: {}", issue.code, issue.path, issue.message);
        if let Some(hint) = &issue.hint {
            eprintln!("  hint: {hint}");
        }
    }
}

fn parse_kind_override(value: &str) -> Result<(String, ColumnKind), String> {
    let (column, kind) = value
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=KIND, got '{value}'"))?;
    let column = column.trim();
    if column.is_empty() {
        return Err("column name must not be empty".to_string());
    }
    let kind = kind.parse::<ColumnKind>().map_err(|err| err.to_string())?;
    Ok((column.to_string(), kind))
}
