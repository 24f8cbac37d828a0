use serde_json::Value;

/// The JSON type a field's value is expected to satisfy. Mirrors the small
/// subset of JSON-Schema `type` values the engine cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
}

impl FieldType {
    pub fn json_schema_type(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
        }
    }
}

/// One field a caller wants collected over the course of a conversation:
/// a stable name, a human prompt used when asking the user for it, a
/// required flag, and the JSON type its value must satisfy.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub prompt: String,
    pub required: bool,
    pub type_hint: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self { name: name.into(), prompt: prompt.into(), required: true, type_hint: FieldType::String }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn of_type(mut self, type_hint: FieldType) -> Self {
        self.type_hint = type_hint;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_required_by_default() {
        let f = Field::new("email", "what's your email?");
        assert!(f.required);
    }

    #[test]
    fn optional_clears_required() {
        let f = Field::new("phone", "phone number?").optional();
        assert!(!f.required);
    }

    #[test]
    fn type_matching() {
        assert!(FieldType::String.matches(&serde_json::json!("x")));
        assert!(!FieldType::String.matches(&serde_json::json!(1)));
        assert!(FieldType::Number.matches(&serde_json::json!(1.5)));
        assert!(FieldType::Boolean.matches(&serde_json::json!(true)));
    }
}
