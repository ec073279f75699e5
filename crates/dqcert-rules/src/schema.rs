use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::model::RuleDocument;

/// Emit the JSON Schema for rule documents.
pub fn rules_json_schema() -> RootSchema {
    schema_for!(RuleDocument)
}
