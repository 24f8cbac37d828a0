use serde_json::{Map, Value};

use agentflow_types::session::StateMap;

use crate::field::Field;

/// An ordered set of fields a caller wants collected during a conversation.
/// Field order is preserved end-to-end — into the emitted JSON Schema and
/// into any missing-field listing — so prompts presented to a model or a
/// user stay stable across turns.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Object-typed JSON Schema, fields ordered exactly as declared. Relies
    /// on `serde_json`'s `preserve_order` feature for deterministic output.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &self.fields {
            properties.insert(
                field.name.clone(),
                serde_json::json!({
                    "type": field.type_hint.json_schema_type(),
                    "description": field.prompt,
                }),
            );
            if field.required {
                required.push(Value::String(field.name.clone()));
            }
        }
        serde_json::json!({
            "type": "object",
            "properties": Value::Object(properties),
            "required": required,
        })
    }

    /// Required fields absent (or type-mismatched) in the given state map,
    /// in declaration order.
    pub fn missing_fields(&self, state: &StateMap) -> Vec<&Field> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .filter(|f| match state.get(&f.name) {
                Some(v) => !f.type_hint.matches(v),
                None => true,
            })
            .collect()
    }

    pub fn is_complete(&self, state: &StateMap) -> bool {
        self.missing_fields(state).is_empty()
    }
}
