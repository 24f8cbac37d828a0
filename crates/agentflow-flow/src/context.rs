use agentflow_types::message::Role;
use agentflow_types::session::{HistoryEntry, Session};

/// A narrow mutable view of a session an `Action` may write through —
/// appending a history entry directly, without taking a dependency on
/// session storage or the rest of `Session`'s surface.
pub trait SessionHandle {
    fn append_message(&mut self, role: Role, text: &str);
}

impl SessionHandle for Session {
    fn append_message(&mut self, role: Role, text: &str) {
        self.append(HistoryEntry::message(role, text.to_string()));
    }
}

/// Telemetry accumulated while evaluating flow rules for one turn.
#[derive(Debug, Clone, Default)]
pub struct TurnTelemetry {
    pub conditions_evaluated: usize,
    pub rules_fired: usize,
}

/// Mutable per-turn state a `FlowRule`'s action may change before the next
/// model call is assembled. The turn engine owns one of these per
/// iteration; flow rules are the only thing that mutates it.
#[derive(Debug, Clone)]
pub struct TurnContext {
    /// Extra system-level instructions accumulated from fired rules.
    pub system_instructions: Vec<String>,
    /// When set, these instructions replace the base system prompt instead
    /// of being appended to it.
    pub system_override: bool,
    /// A tool name a rule has recommended the model reach for.
    pub recommended_tool: Option<String>,
    /// Current loop iteration, 0-based.
    pub iteration: usize,
    pub telemetry: TurnTelemetry,
    /// Set by an action that wants the engine to ask the model to
    /// summarize rather than continue normally.
    pub summarize_requested: bool,
}

impl TurnContext {
    pub fn new() -> Self {
        Self {
            system_instructions: Vec::new(),
            system_override: false,
            recommended_tool: None,
            iteration: 0,
            telemetry: TurnTelemetry::default(),
            summarize_requested: false,
        }
    }

    pub fn append_system_instruction(&mut self, text: impl Into<String>) {
        self.system_instructions.push(text.into());
    }

    pub fn override_system_instructions(&mut self, text: impl Into<String>) {
        self.system_instructions = vec![text.into()];
        self.system_override = true;
    }
}

impl Default for TurnContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view a `Condition` evaluates against: the session as it stands
/// at the top of the current iteration, plus the most recent user input
/// that started this turn.
pub struct TurnData<'a> {
    pub session: &'a Session,
    pub latest_user_input: &'a str,
}
