//! Common imports for building an agent.

pub use crate::{AgentBuilder, BasicAgent};
pub use agentflow_context::{ContextItem, ContextProvider, HistoryProvider, SystemPromptProvider};
pub use agentflow_engine::{Engine, EngineConfig, EngineError, TurnMetadata, TurnOutcome};
pub use agentflow_flow::{
    Action, And, AppendSystemInstruction, CompletionStage, Condition, Contains, FlowEngine, FlowRule, InjectMessage,
    MessageCountAtLeast, MissingFields, Not, Or, OverrideSystemInstruction, RecommendTool, RequestSummarization,
    SessionHandle,
};
pub use agentflow_providers::{ChatModel, OpenAiCompatProvider, Settings, ToolChoice};
pub use agentflow_schema::{Field, FieldType, Schema};
pub use agentflow_sessions::{CreateOptions, InMemorySessionStore, SessionStore};
pub use agentflow_tools::{DispatchOutcome, Tool, ToolContext, ToolRegistry};
pub use agentflow_types::{AssistantMessage, ChatMessage, Error, HistoryEntry, Role, Session, ToolCall, ToolDefinition};
