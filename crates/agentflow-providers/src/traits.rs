use async_trait::async_trait;

use agentflow_types::error::Result;
use agentflow_types::message::{AssistantMessage, ChatMessage, ToolDefinition};

/// Inference settings every provider understands, even if it ignores some.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
    pub stop: Vec<String>,
}

/// How the model should pick among the offered tools.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ToolChoice {
    #[default]
    Auto,
    None,
    Named(String),
}

/// Single operation every chat-model adapter implements: send a message
/// list plus the active tool set, get back one assistant message (free
/// text, or a non-empty list of tool calls).
///
/// Implementations own wire encoding, tool advertisement, retry with
/// exponential backoff on transient failures, and a hard per-call timeout.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        model_id: &str,
        settings: &Settings,
        tools: &[ToolDefinition],
        tool_choice: ToolChoice,
    ) -> Result<AssistantMessage>;
}
