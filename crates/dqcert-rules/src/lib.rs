//! Rule documents: JSON contract, validation and discovery next to data files.

pub mod discover;
pub mod errors;
pub mod model;
pub mod schema;
pub mod validate;

pub use discover::{DiscoveredRules, discover_rules, load_rules_for, rule_candidates};
pub use errors::{IssueSeverity, Result, RuleError, ValidationIssue, ValidationReport};
pub use model::{KNOWN_KEYS, OneOrMany, RuleDocument};
pub use schema::rules_json_schema;
pub use validate::{
    ValidatedRules, load_rules_file, parse_rules_str, validate_rules, validate_rules_json,
    validate_rules_semantics,
};
