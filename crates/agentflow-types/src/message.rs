use serde::{Deserialize, Serialize};

/// A role in a chat-completion conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single message handed to (or returned by) a chat model.
///
/// Provider-agnostic: every `ChatModel` adapter translates to/from this at
/// its own wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    /// Set when `role == Tool`: the call this message answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Set when `role == Tool`: the name of the tool that produced it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self { role: Role::System, text: text.into(), tool_call_id: None, name: None }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into(), tool_call_id: None, name: None }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, text: text.into(), tool_call_id: None, name: None }
    }

    pub fn tool_result(call_id: impl Into<String>, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            text: text.into(),
            tool_call_id: Some(call_id.into()),
            name: Some(name.into()),
        }
    }
}

/// A model-originated request to invoke a named tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub function_name: String,
    /// Raw JSON-encoded arguments, exactly as the model emitted them.
    pub arguments: String,
}

/// The assistant's response to one `ChatModel::generate` call: either free
/// text, or a non-empty list of tool calls (never both with content, per
/// the function-calling contract most providers expose).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AssistantMessage {
    pub text: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

impl AssistantMessage {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), tool_calls: Vec::new() }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// A tool's advertised JSON-Schema surface, handed to the model verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// Object-typed JSON Schema: `{type: "object", properties, required}`.
    pub parameters: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_result_carries_call_id_and_name() {
        let m = ChatMessage::tool_result("c1", "get_weather", "{\"temp\":22}");
        assert_eq!(m.role, Role::Tool);
        assert_eq!(m.tool_call_id.as_deref(), Some("c1"));
        assert_eq!(m.name.as_deref(), Some("get_weather"));
    }

    #[test]
    fn assistant_message_empty_arguments_defaults() {
        let empty = "";
        let args: serde_json::Value = if empty.trim().is_empty() {
            serde_json::Value::Object(Default::default())
        } else {
            serde_json::from_str(empty).unwrap()
        };
        assert!(args.is_object());
    }
}
