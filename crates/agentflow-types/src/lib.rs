//! Shared domain types for the agentflow runtime: the chat-message wire
//! model, session/history data model, and the error enum every other
//! agentflow crate returns.

pub mod error;
pub mod message;
pub mod session;

pub use error::{Error, Result};
pub use message::{AssistantMessage, ChatMessage, Role, ToolCall, ToolDefinition};
pub use session::{HistoryContent, HistoryEntry, Session, StateMap};
