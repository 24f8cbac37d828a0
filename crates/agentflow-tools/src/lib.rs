//! Tool registry: name-indexed lookup, JSON-Schema advertisement, argument
//! parsing, and invocation.

pub mod registry;

pub use registry::{DispatchOutcome, Tool, ToolContext, ToolRegistry};
