use agentflow_types::error::Result;
use agentflow_types::message::Role;

use crate::context::{SessionHandle, TurnContext};

/// A mutation applied to the turn context (and, optionally, session
/// history) when a rule's condition holds. Errors here are logged by the
/// engine and otherwise non-fatal — an action never aborts a turn.
pub trait Action: Send + Sync {
    fn apply(&self, ctx: &mut TurnContext, session: &mut dyn SessionHandle) -> Result<()>;
}

/// Appends to the system instructions accumulated so far.
pub struct AppendSystemInstruction {
    text: String,
}

impl AppendSystemInstruction {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Action for AppendSystemInstruction {
    fn apply(&self, ctx: &mut TurnContext, _session: &mut dyn SessionHandle) -> Result<()> {
        ctx.append_system_instruction(self.text.clone());
        Ok(())
    }
}

/// Replaces the base system prompt outright for the rest of this turn.
pub struct OverrideSystemInstruction {
    text: String,
}

impl OverrideSystemInstruction {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Action for OverrideSystemInstruction {
    fn apply(&self, ctx: &mut TurnContext, _session: &mut dyn SessionHandle) -> Result<()> {
        ctx.override_system_instructions(self.text.clone());
        Ok(())
    }
}

/// Hints the model toward a specific tool for the next call.
pub struct RecommendTool {
    tool_name: String,
}

impl RecommendTool {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self { tool_name: tool_name.into() }
    }
}

impl Action for RecommendTool {
    fn apply(&self, ctx: &mut TurnContext, _session: &mut dyn SessionHandle) -> Result<()> {
        ctx.recommended_tool = Some(self.tool_name.clone());
        Ok(())
    }
}

/// Marks the turn as wanting a summarization pass rather than continuing
/// the normal loop.
pub struct RequestSummarization;

impl Action for RequestSummarization {
    fn apply(&self, ctx: &mut TurnContext, _session: &mut dyn SessionHandle) -> Result<()> {
        ctx.summarize_requested = true;
        Ok(())
    }
}

/// Appends a message directly into session history, bypassing the model —
/// for rules that want to record something (a notice, a canned
/// acknowledgement) without spending a model round trip on it.
pub struct InjectMessage {
    role: Role,
    text: String,
}

impl InjectMessage {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self { role, text: text.into() }
    }
}

impl Action for InjectMessage {
    fn apply(&self, _ctx: &mut TurnContext, session: &mut dyn SessionHandle) -> Result<()> {
        session.append_message(self.role, &self.text);
        Ok(())
    }
}
