//! Conversational agent runtime.
//!
//! Two ways in, wrapping the same [`agentflow_engine::Engine`]:
//!
//! - [`AgentBuilder`] / [`BasicAgent`]: a fluent builder for the common
//!   case (one model, a fixed tool set, in-memory sessions by default).
//! - `agentflow_engine::Engine` directly, for callers who want to own
//!   session lifecycle, cancellation, and turn orchestration themselves.

pub mod builder;
pub mod prelude;

pub use builder::{AgentBuilder, BasicAgent};

pub use agentflow_context as context;
pub use agentflow_engine as engine;
pub use agentflow_flow as flow;
pub use agentflow_providers as providers;
pub use agentflow_schema as schema;
pub use agentflow_sessions as sessions;
pub use agentflow_tools as tools;
pub use agentflow_types as types;
