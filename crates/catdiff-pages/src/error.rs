//! Errors that abort validation of a whole environment.
//!
//! Broken references inside pages are not errors; they are reported as
//! violations and warnings.

#[derive(Debug, thiserror::Error)]
pub enum PagesError {
    /// The blueprint document is not an array of blueprint records.
    #[error("blueprints must be an array, got {0}")]
    BlueprintsNotArray(&'static str),

    /// The page document is not an array of page records.
    #[error("pages must be an array, got {0}")]
    PagesNotArray(&'static str),
}

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
