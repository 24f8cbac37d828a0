use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::Role;

/// Arbitrary key/value state attached to a session (collected field values,
/// schema-guided-collection progress, caller-defined bookkeeping).
pub type StateMap = HashMap<String, Value>;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// History entries
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The typed payload of a history entry. Tagged by `type` on the wire so
/// alternate store bindings can serialize a session as a plain JSON
/// document (see the store configuration section of the external
/// interfaces).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryContent {
    Message {
        role: Role,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_call_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    ToolCall {
        tool_name: String,
        arguments: Value,
    },
    ToolResult {
        tool_name: String,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Reserved: not surfaced to the model by default.
    Thinking {
        payload: Value,
    },
}

impl HistoryContent {
    pub fn is_message(&self) -> bool {
        matches!(self, HistoryContent::Message { .. })
    }

    /// The message role, if this entry is a message.
    pub fn message_role(&self) -> Option<Role> {
        match self {
            HistoryContent::Message { role, .. } => Some(*role),
            _ => None,
        }
    }
}

/// One entry in a session's append-only history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub content: HistoryContent,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl HistoryEntry {
    fn new(content: HistoryContent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            content,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn message(role: Role, text: impl Into<String>) -> Self {
        Self::new(HistoryContent::Message {
            role,
            text: text.into(),
            tool_call_id: None,
            name: None,
        })
    }

    pub fn tool_message(call_id: impl Into<String>, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(HistoryContent::Message {
            role: Role::Tool,
            text: text.into(),
            tool_call_id: Some(call_id.into()),
            name: Some(name.into()),
        })
    }

    pub fn tool_call(tool_name: impl Into<String>, arguments: Value) -> Self {
        Self::new(HistoryContent::ToolCall { tool_name: tool_name.into(), arguments })
    }

    pub fn tool_result_ok(tool_name: impl Into<String>, result: Value) -> Self {
        Self::new(HistoryContent::ToolResult {
            tool_name: tool_name.into(),
            success: true,
            result: Some(result),
            error: None,
        })
    }

    pub fn tool_result_err(tool_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(HistoryContent::ToolResult {
            tool_name: tool_name.into(),
            success: false,
            result: None,
            error: Some(error.into()),
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Persistent conversation state: ordered history + key/value state, keyed
/// by an opaque id. Owned exclusively by whichever `SessionStore` returned
/// it — see that crate for the single-process-vs-snapshot distinction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub state: StateMap,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl Session {
    pub fn new(id: impl Into<String>, ttl: Option<chrono::Duration>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            created_at: now,
            updated_at: now,
            expires_at: ttl.map(|d| now + d),
            state: StateMap::new(),
            history: Vec::new(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Utc::now() >= exp)
    }

    /// Append an entry, advancing `updated_at`. Returns the stored entry so
    /// callers can read back its generated id/timestamp.
    pub fn append(&mut self, entry: HistoryEntry) -> &HistoryEntry {
        self.history.push(entry);
        self.updated_at = Utc::now();
        self.history.last().expect("just pushed")
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Number of `message`-typed history entries (used by
    /// `message_count_at_least`).
    pub fn message_count(&self) -> usize {
        self.history.iter().filter(|e| e.content.is_message()).count()
    }

    /// The last `limit` entries, newest-first. `limit == 0` returns all
    /// entries.
    pub fn history_newest_first(&self, limit: usize) -> Vec<&HistoryEntry> {
        let mut rev: Vec<&HistoryEntry> = self.history.iter().rev().collect();
        if limit > 0 && rev.len() > limit {
            rev.truncate(limit);
        }
        rev
    }

    /// The full chronological message list (role + text), used to assemble
    /// the messages handed to the chat model each iteration.
    pub fn chronological_messages(&self) -> Vec<(Role, String, Option<String>, Option<String>)> {
        self.history
            .iter()
            .filter_map(|e| match &e.content {
                HistoryContent::Message { role, text, tool_call_id, name } => {
                    Some((*role, text.clone(), tool_call_id.clone(), name.clone()))
                }
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_entry_json_round_trip_message() {
        let entry = HistoryEntry::message(Role::User, "hello");
        let json = serde_json::to_string(&entry).unwrap();
        let back: HistoryEntry = serde_json::from_str(&json).unwrap();
        let json2 = serde_json::to_string(&back).unwrap();
        assert_eq!(json, json2);
    }

    #[test]
    fn history_entry_json_round_trip_tool_result_failure() {
        let entry = HistoryEntry::tool_result_err("get_weather", "timed out");
        let json = serde_json::to_string(&entry).unwrap();
        let back: HistoryEntry = serde_json::from_str(&json).unwrap();
        let json2 = serde_json::to_string(&back).unwrap();
        assert_eq!(json, json2);
    }

    #[test]
    fn message_count_ignores_tool_calls_and_results() {
        let mut s = Session::new("s1", None);
        s.append(HistoryEntry::message(Role::User, "hi"));
        s.append(HistoryEntry::tool_call("get_weather", serde_json::json!({})));
        s.append(HistoryEntry::tool_result_ok("get_weather", serde_json::json!({"temp": 22})));
        s.append(HistoryEntry::message(Role::Assistant, "it's sunny"));
        assert_eq!(s.message_count(), 2);
    }

    #[test]
    fn history_newest_first_limit_zero_returns_all() {
        let mut s = Session::new("s1", None);
        for i in 0..5 {
            s.append(HistoryEntry::message(Role::User, format!("msg {i}")));
        }
        assert_eq!(s.history_newest_first(0).len(), 5);
        assert_eq!(s.history_newest_first(2).len(), 2);
    }

    #[test]
    fn history_newest_first_orders_newest_first() {
        let mut s = Session::new("s1", None);
        s.append(HistoryEntry::message(Role::User, "first"));
        s.append(HistoryEntry::message(Role::User, "second"));
        let recent = s.history_newest_first(0);
        assert_eq!(recent[0].content.message_role(), Some(Role::User));
        match &recent[0].content {
            HistoryContent::Message { text, .. } => assert_eq!(text, "second"),
            _ => panic!("expected message"),
        }
    }

    #[test]
    fn is_expired_false_without_ttl() {
        let s = Session::new("s1", None);
        assert!(!s.is_expired());
    }

    #[test]
    fn is_expired_true_after_negative_ttl() {
        let s = Session::new("s1", Some(chrono::Duration::seconds(-1)));
        assert!(s.is_expired());
    }

    #[test]
    fn updated_at_advances_on_append() {
        let mut s = Session::new("s1", None);
        let created = s.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(5));
        s.append(HistoryEntry::message(Role::User, "hi"));
        assert!(s.updated_at >= created);
    }
}
