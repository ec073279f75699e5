use std::path::{Path, PathBuf};

use dqcert_core::RuleSet;
use tracing::{debug, info};

use crate::errors::{Result, ValidationIssue};
use crate::validate::load_rules_file;

/// Rules resolved for a data file.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredRules {
    /// Rule file that was used, `None` when no candidate existed.
    pub path: Option<PathBuf>,
    pub rules: RuleSet,
    pub warnings: Vec<ValidationIssue>,
}

/// Candidate rule files for `dir/name.ext`, in lookup order.
pub fn rule_candidates(data_path: &Path) -> Vec<PathBuf> {
    let dir = data_path.parent().unwrap_or_else(|| Path::new(""));
    let mut candidates = Vec::with_capacity(4);
    if let Some(stem) = data_path.file_stem().and_then(|stem| stem.to_str()) {
        candidates.push(dir.join(format!("{stem}.rules.json")));
        candidates.push(dir.join(format!("{stem}.dq.json")));
    }
    candidates.push(dir.join("rules.json"));
    candidates.push(dir.join("dq_rules.json"));
    candidates
}

/// First existing rule file next to the data file.
pub fn discover_rules(data_path: &Path) -> Option<PathBuf> {
    rule_candidates(data_path)
        .into_iter()
        .find(|candidate| candidate.is_file())
}

/// Discover and load the rules for a data file.
///
/// Falls back to the empty rule set when no candidate exists. A discovered
/// file that fails validation is returned as an error.
pub fn load_rules_for(data_path: &Path) -> Result<DiscoveredRules> {
    let Some(path) = discover_rules(data_path) else {
        debug!(data = %data_path.display(), "no rule file found, using empty rule set");
        return Ok(DiscoveredRules::default());
    };

    let validated = load_rules_file(&path)?;
    info!(
        data = %data_path.display(),
        rules = %path.display(),
        warnings = validated.warnings.len(),
        "rule file discovered"
    );
    Ok(DiscoveredRules {
        path: Some(path),
        rules: validated.rules,
        warnings: validated.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_follow_lookup_order() {
        let candidates = rule_candidates(Path::new("data/sales.2024.csv"));
        let expected: Vec<PathBuf> = [
            "data/sales.2024.rules.json",
            "data/sales.2024.dq.json",
            "data/rules.json",
            "data/dq_rules.json",
        ]
        .iter()
        .map(PathBuf::from)
        .collect();
        assert_eq!(candidates, expected);
    }

    #[test]
    fn bare_file_name_looks_in_current_directory() {
        let candidates = rule_candidates(Path::new("orders.csv"));
        assert_eq!(candidates[0], PathBuf::from("orders.rules.json"));
        assert_eq!(candidates[3], PathBuf::from("dq_rules.json"));
    }
}
