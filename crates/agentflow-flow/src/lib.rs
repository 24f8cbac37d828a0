//! Condition/action flow rules evaluated once per turn iteration, and the
//! per-turn context they mutate.

pub mod action;
pub mod condition;
pub mod context;
pub mod rule;

pub use action::{
    Action, AppendSystemInstruction, InjectMessage, OverrideSystemInstruction, RecommendTool, RequestSummarization,
};
pub use condition::{And, CompletionStage, Condition, Contains, MessageCountAtLeast, MissingFields, Not, Or, Predicate};
pub use context::{SessionHandle, TurnContext, TurnData, TurnTelemetry};
pub use rule::{FlowEngine, FlowRule};
