use std::env;
use std::path::PathBuf;

use dqcert_rules::{RuleError, ValidationReport, load_rules_file};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let rules_path: PathBuf = args.next().map(PathBuf::from).ok_or("missing rules path")?;
    if args.next().is_some() {
        return Err("unexpected argument".into());
    }

    let validated = match load_rules_file(&rules_path) {
        Ok(validated) => validated,
        Err(RuleError::Invalid(report)) => {
            eprintln!("rule validation failed");
            print_report(&report);
            std::process::exit(1);
        }
        Err(err) => return Err(err.into()),
    };

    if !validated.warnings.is_empty() {
        eprintln!("rules validated with warnings:");
        print_report(&ValidationReport {
            errors: Vec::new(),
            warnings: validated.warnings,
        });
    } else {
        println!("rules validated successfully");
    }
    println!("{}", serde_json::to_string_pretty(&validated.rules)?);

    Ok(())
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
