use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use dqcert_core::RuleSet;
use dqcert_eval::{EvaluateOptions, EvaluationResult};
use serde::Serialize;

use super::RegistryResult;
use super::atomic::{write_artifact, write_json_artifact};

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub run_dir: PathBuf,
    pub data_path: PathBuf,
    pub rules_path: Option<PathBuf>,
    pub rules: RuleSet,
    pub options: EvaluateOptions,
    pub strict: bool,
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
pub struct RunConfig<'a> {
    pub run_id: &'a str,
    pub started_at: String,
    pub data_path: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules_path: Option<&'a Path>,
    pub rules: &'a RuleSet,
    pub options: &'a EvaluateOptions,
    pub strict: bool,
    pub git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
pub struct GitInfo {
    pub commit: Option<String>,
    pub dirty: Option<bool>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub logs_path: PathBuf,
    pub result_path: PathBuf,
    pub report_path: PathBuf,
}

pub fn start_run(ctx: &RunContext) -> RegistryResult<RunPaths> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let root = ctx.run_dir.join(format!("{timestamp}__run_{}", ctx.run_id));

    create_dir_all(&root)?;

    let config = RunConfig {
        run_id: &ctx.run_id,
        started_at: ctx.started_at.to_rfc3339(),
        data_path: &ctx.data_path,
        rules_path: ctx.rules_path.as_deref(),
        rules: &ctx.rules,
        options: &ctx.options,
        strict: ctx.strict,
        git: collect_git_info(),
    };
    write_json_artifact(&root.join("config.json"), &config)?;

    let logs_path = root.join("logs.ndjson");
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logs_path)?;

    Ok(RunPaths {
        logs_path,
        result_path: root.join("result.json"),
        report_path: root.join("report.md"),
        root,
    })
}

pub fn write_result(paths: &RunPaths, result: &EvaluationResult) -> RegistryResult<()> {
    write_json_artifact(&paths.result_path, result)
}

pub fn write_report(paths: &RunPaths, report: &str) -> RegistryResult<()> {
    write_artifact(&paths.report_path, report.as_bytes())
}

pub fn collect_git_info() -> GitInfo {
    let commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
            } else {
                None
            }
        })
        .filter(|value| !value.is_empty());

    let dirty = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.is_empty());

    GitInfo { commit, dirty }
}
