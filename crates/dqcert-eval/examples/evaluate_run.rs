use std::env;
use std::path::PathBuf;

use dqcert_eval::{EvaluateOptions, EvaluationEngine, render_report};
use dqcert_rules::{load_rules_file, load_rules_for};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let mut data_path: Option<PathBuf> = None;
    let mut rules_path: Option<PathBuf> = None;
    let mut preview: Option<usize> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--rules" => rules_path = args.next().map(PathBuf::from),
            "--preview" => preview = args.next().map(|value| value.parse()).transpose()?,
            _ => {
                if data_path.is_none() {
                    data_path = Some(PathBuf::from(arg));
                } else {
                    return Err("unexpected argument".into());
                }
            }
        }
    }

    let data_path = data_path.ok_or("missing data file path")?;
    let rules = match rules_path {
        Some(path) => load_rules_file(&path)?.rules,
        None => load_rules_for(&data_path)?.rules,
    };

    let mut options = EvaluateOptions::default();
    if let Some(limit) = preview {
        options.preview_limit = limit;
    }
    let engine = EvaluationEngine::new(options);
    let result = engine.run(&data_path, &rules)?;

    println!("{}", render_report(&result));
    Ok(())
}
