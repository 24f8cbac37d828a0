use serde_json::Value;

use crate::field::FieldType;
use crate::schema::Schema;

/// Best-effort extraction of schema field values out of free text. Never
/// errors: a field with no confident match is simply omitted, and schema
/// collection falls back to prompting for it normally.
pub fn extract_fields(schema: &Schema, text: &str) -> Vec<(String, Value)> {
    let mut found = Vec::new();
    for field in schema.fields() {
        let candidate = match field.type_hint {
            FieldType::String => extract_string_like(field.name.as_str(), text),
            FieldType::Number => extract_number(text),
            FieldType::Boolean => extract_boolean(text),
        };
        if let Some(value) = candidate {
            found.push((field.name.clone(), value));
        }
    }
    found
}

fn extract_string_like(field_name: &str, text: &str) -> Option<Value> {
    if field_name.eq_ignore_ascii_case("email") {
        return text
            .split_whitespace()
            .find(|tok| tok.contains('@') && tok.contains('.'))
            .map(|tok| Value::String(tok.trim_matches(|c: char| !c.is_alphanumeric() && c != '@' && c != '.').to_string()));
    }
    None
}

fn extract_number(text: &str) -> Option<Value> {
    text.split_whitespace().find_map(|tok| tok.parse::<f64>().ok()).map(|n| serde_json::json!(n))
}

fn extract_boolean(text: &str) -> Option<Value> {
    let lower = text.to_lowercase();
    if lower.contains("yes") || lower.contains("true") {
        Some(Value::Bool(true))
    } else if lower.contains("no") || lower.contains("false") {
        Some(Value::Bool(false))
    } else {
        None
    }
}
