use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use agentflow_types::error::{Error, Result};
use agentflow_types::message::{ToolCall, ToolDefinition};

/// Per-call execution context handed to a tool: carries whatever bounded
/// cancellation the engine derived for this call (per-tool timeout, itself
/// derived from the outer turn cancellation). A tool that runs a long
/// operation it can interrupt should poll `cancellation_token.is_cancelled()`.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    pub session_id: String,
    pub cancellation_token: CancellationToken,
}

impl ToolContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self { session_id: session_id.into(), cancellation_token: CancellationToken::new() }
    }

    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }
}

/// A callable tool the model may invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable name the model refers to this tool by.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Object-typed JSON Schema describing the argument object.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. Errors here are wrapped as `Error::ToolExec` by the
    /// registry — never surfaced as anything else.
    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<Value>;
}

impl dyn Tool {
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// The outcome of dispatching one model-originated tool call, already
/// shaped for the three tool-failure kinds the turn engine must
/// distinguish and record as distinct `tool_result` entries.
pub enum DispatchOutcome {
    Success(Value),
    NotFound,
    ArgParseError(String),
    ExecError(String),
}

/// Name-indexed registry of tools. Built once at construction and read
/// concurrently during turns — registration itself is the only mutating
/// path and is expected to happen before the registry is shared.
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: RwLock::new(HashMap::new()) }
    }

    /// Register a tool. Registering a name that's already present is an
    /// error — callers that want to replace a tool must `unregister` first.
    pub fn register(&self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        let mut tools = self.tools.write();
        if tools.contains_key(&name) {
            return Err(Error::Config(format!("tool already registered: {name}")));
        }
        tools.insert(name, tool);
        Ok(())
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.tools.write().remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.read().is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Tool definitions, advertised to the model verbatim.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.read().values().map(|t| t.definition()).collect()
    }

    /// An empty arguments string is treated as `{}`, not a parse failure.
    pub fn parse_arguments(raw: &str) -> std::result::Result<Value, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(trimmed).map_err(|e| e.to_string())
    }

    /// Parse the call's arguments, look up the tool, and invoke it.
    /// Not-found and argument-parse failures are distinguished from
    /// execution failures so the caller can record the right
    /// `tool_result` shape.
    pub async fn execute_call(&self, ctx: &ToolContext, call: &ToolCall) -> DispatchOutcome {
        let tool = match self.get(&call.function_name) {
            Some(t) => t,
            None => return DispatchOutcome::NotFound,
        };

        let args = match Self::parse_arguments(&call.arguments) {
            Ok(v) => v,
            Err(e) => return DispatchOutcome::ArgParseError(e),
        };

        match tool.execute(ctx, args).await {
            Ok(value) => DispatchOutcome::Success(value),
            Err(e) => DispatchOutcome::ExecError(e.to_string()),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes its input"
        }
        fn parameters_schema(&self) -> Value {
            serde_json::json!({"type": "object", "properties": {}, "required": []})
        }
        async fn execute(&self, _ctx: &ToolContext, args: Value) -> Result<Value> {
            Ok(args)
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "fail"
        }
        fn description(&self) -> &str {
            "always fails"
        }
        fn parameters_schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, _ctx: &ToolContext, _args: Value) -> Result<Value> {
            Err(Error::Other("boom".to_string()))
        }
    }

    #[test]
    fn registering_duplicate_name_errors() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();
        let err = registry.register(Arc::new(EchoTool)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn unregister_then_register_restores_original_registry() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();
        assert!(registry.unregister("echo"));
        registry.register(Arc::new(EchoTool)).unwrap();
        assert_eq!(registry.names(), vec!["echo".to_string()]);
    }

    #[test]
    fn empty_arguments_string_parses_as_empty_object() {
        let parsed = ToolRegistry::parse_arguments("").unwrap();
        assert_eq!(parsed, serde_json::json!({}));
    }

    #[test]
    fn whitespace_only_arguments_parses_as_empty_object() {
        let parsed = ToolRegistry::parse_arguments("   ").unwrap();
        assert_eq!(parsed, serde_json::json!({}));
    }

    #[test]
    fn invalid_json_arguments_is_a_distinct_error() {
        assert!(ToolRegistry::parse_arguments("{not json").is_err());
    }

    #[tokio::test]
    async fn execute_call_not_found_is_distinct_from_exec_error() {
        let registry = ToolRegistry::new();
        let call = ToolCall {
            id: "c1".into(),
            function_name: "nonexistent".into(),
            arguments: "{}".into(),
        };
        let ctx = ToolContext::new("s1");
        match registry.execute_call(&ctx, &call).await {
            DispatchOutcome::NotFound => {}
            _ => panic!("expected NotFound"),
        }
    }

    #[tokio::test]
    async fn execute_call_arg_parse_failure_is_distinct_from_exec_error() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();
        let call = ToolCall {
            id: "c1".into(),
            function_name: "echo".into(),
            arguments: "{not json".into(),
        };
        let ctx = ToolContext::new("s1");
        match registry.execute_call(&ctx, &call).await {
            DispatchOutcome::ArgParseError(_) => {}
            _ => panic!("expected ArgParseError"),
        }
    }

    #[tokio::test]
    async fn execute_call_success_round_trips_arguments() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();
        let call = ToolCall {
            id: "c1".into(),
            function_name: "echo".into(),
            arguments: "{\"location\":\"Tokyo\"}".into(),
        };
        let ctx = ToolContext::new("s1");
        match registry.execute_call(&ctx, &call).await {
            DispatchOutcome::Success(v) => assert_eq!(v, serde_json::json!({"location": "Tokyo"})),
            _ => panic!("expected Success"),
        }
    }

    #[tokio::test]
    async fn execute_call_tool_error_is_exec_error() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(FailingTool)).unwrap();
        let call = ToolCall { id: "c1".into(), function_name: "fail".into(), arguments: "{}".into() };
        let ctx = ToolContext::new("s1");
        match registry.execute_call(&ctx, &call).await {
            DispatchOutcome::ExecError(msg) => assert!(msg.contains("boom")),
            _ => panic!("expected ExecError"),
        }
    }
}
