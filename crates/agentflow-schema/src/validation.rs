use serde_json::Value;

use crate::schema::Schema;

/// Outcome of attempting to parse a model's structured-output text against
/// a schema. A parse or validation failure is never a hard error here —
/// the caller (the turn engine) surfaces it as metadata on an otherwise
/// successful turn.
#[derive(Debug, Clone)]
pub enum StructuredParseOutcome {
    Ok(Value),
    Error(String),
}

impl StructuredParseOutcome {
    pub fn value(&self) -> Option<&Value> {
        match self {
            StructuredParseOutcome::Ok(v) => Some(v),
            StructuredParseOutcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            StructuredParseOutcome::Ok(_) => None,
            StructuredParseOutcome::Error(e) => Some(e.as_str()),
        }
    }
}

/// Parse `raw` as JSON and check it against the schema's required fields
/// and declared types. Returns `Error` (never panics, never propagates a
/// `Result::Err`) on invalid JSON or a validation mismatch.
pub fn parse_structured_output(schema: &Schema, raw: &str) -> StructuredParseOutcome {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => return StructuredParseOutcome::Error(format!("invalid JSON: {e}")),
    };

    let Some(obj) = value.as_object() else {
        return StructuredParseOutcome::Error("structured output must be a JSON object".to_string());
    };

    for field in schema.fields() {
        match obj.get(&field.name) {
            Some(v) if field.type_hint.matches(v) => {}
            Some(_) => {
                return StructuredParseOutcome::Error(format!(
                    "field `{}` has the wrong type",
                    field.name
                ))
            }
            None if field.required => {
                return StructuredParseOutcome::Error(format!("missing required field `{}`", field.name))
            }
            None => {}
        }
    }

    StructuredParseOutcome::Ok(value)
}
