//! Context providers: pluggable producers of prompt fragments from a
//! session. The engine composes providers in caller-declared order and
//! concatenates their output to form the non-history portion of the prompt.
//!
//! No dependency resolution between providers — composition is a flat list,
//! concatenated in declaration order.

use std::collections::HashMap;

use agentflow_types::session::{HistoryContent, Session};
use agentflow_types::Role;
use serde_json::Value;

/// One fragment of assembled prompt context.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextItem {
    /// For history-derived items this is the message role ("user",
    /// "assistant", ...) or a type tag ("tool_call", "thinking", ...).
    pub item_type: String,
    pub text: String,
    pub metadata: HashMap<String, Value>,
}

impl ContextItem {
    pub fn new(item_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self { item_type: item_type.into(), text: text.into(), metadata: HashMap::new() }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// A producer of context items from a session.
pub trait ContextProvider: Send + Sync {
    fn provide(&self, session: &Session) -> Vec<ContextItem>;
}

/// Emits one system-role context item with a fixed string.
pub struct SystemPromptProvider {
    prompt: String,
}

impl SystemPromptProvider {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into() }
    }
}

impl ContextProvider for SystemPromptProvider {
    fn provide(&self, _session: &Session) -> Vec<ContextItem> {
        vec![ContextItem::new("system", self.prompt.clone())]
    }
}

/// Returns the last `limit` history entries, newest-first, mapped to
/// context items by entry type. `limit == 0` returns the full history.
pub struct HistoryProvider {
    limit: usize,
}

impl HistoryProvider {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl ContextProvider for HistoryProvider {
    fn provide(&self, session: &Session) -> Vec<ContextItem> {
        session
            .history_newest_first(self.limit)
            .into_iter()
            .map(|entry| match &entry.content {
                HistoryContent::Message { role, text, .. } => {
                    ContextItem::new(role_tag(*role), text.clone())
                }
                HistoryContent::ToolCall { tool_name, arguments } => {
                    ContextItem::new(
                        "tool_call",
                        format!("Tool: {tool_name}\nParameters: {arguments}"),
                    )
                    .with_metadata("tool_name", Value::String(tool_name.clone()))
                }
                HistoryContent::ToolResult { tool_name, success: true, result, .. } => {
                    let result_json = result.clone().unwrap_or(Value::Null);
                    ContextItem::new(
                        "tool_result",
                        format!("Tool: {tool_name}\nSuccess: true\nResult: {result_json}"),
                    )
                    .with_metadata("tool_name", Value::String(tool_name.clone()))
                }
                HistoryContent::ToolResult { tool_name, success: false, error, .. } => {
                    let msg = error.as_deref().unwrap_or("unknown error");
                    ContextItem::new(
                        "tool_result",
                        format!("Tool: {tool_name}\nSuccess: false\nError: {msg}"),
                    )
                    .with_metadata("tool_name", Value::String(tool_name.clone()))
                }
                HistoryContent::Thinking { payload } => {
                    let text = match payload {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    ContextItem::new("thinking", text)
                }
            })
            .collect()
    }
}

fn role_tag(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_types::session::HistoryEntry;

    #[test]
    fn system_prompt_provider_emits_one_item() {
        let provider = SystemPromptProvider::new("be helpful");
        let session = Session::new("s1", None);
        let items = provider.provide(&session);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_type, "system");
        assert_eq!(items[0].text, "be helpful");
    }

    #[test]
    fn history_provider_limit_zero_returns_all() {
        let mut session = Session::new("s1", None);
        for i in 0..10 {
            session.append(HistoryEntry::message(Role::User, format!("m{i}")));
        }
        let provider = HistoryProvider::new(0);
        assert_eq!(provider.provide(&session).len(), 10);
    }

    #[test]
    fn history_provider_respects_limit_and_newest_first() {
        let mut session = Session::new("s1", None);
        session.append(HistoryEntry::message(Role::User, "first"));
        session.append(HistoryEntry::message(Role::User, "second"));
        let provider = HistoryProvider::new(1);
        let items = provider.provide(&session);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "second");
    }

    #[test]
    fn history_provider_formats_successful_tool_result() {
        let mut session = Session::new("s1", None);
        session.append(HistoryEntry::tool_result_ok(
            "get_weather",
            serde_json::json!({"temp": 22, "condition": "Sunny"}),
        ));
        let provider = HistoryProvider::new(0);
        let items = provider.provide(&session);
        assert_eq!(items[0].item_type, "tool_result");
        assert!(items[0].text.starts_with("Tool: get_weather\nSuccess: true\nResult:"));
    }

    #[test]
    fn history_provider_formats_failed_tool_result() {
        let mut session = Session::new("s1", None);
        session.append(HistoryEntry::tool_result_err("get_weather", "boom"));
        let provider = HistoryProvider::new(0);
        let items = provider.provide(&session);
        assert_eq!(items[0].text, "Tool: get_weather\nSuccess: false\nError: boom");
    }
}
