use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use agentflow_context::ContextProvider;
use agentflow_engine::{Engine, EngineConfig, Result, TurnOutcome};
use agentflow_flow::{FlowEngine, FlowRule};
use agentflow_providers::ChatModel;
use agentflow_schema::Schema;
use agentflow_sessions::{CreateOptions, InMemorySessionStore, SessionStore};
use agentflow_tools::{Tool, ToolRegistry};
use agentflow_types::session::Session;

/// Fluent entry point for the common case: in-memory sessions, a fixed
/// tool set, a handful of flow rules, and a single chat model. Hands back
/// an `Engine` underneath, so anything this builder doesn't expose is
/// still reachable by constructing `Engine` directly.
pub struct AgentBuilder {
    model: Option<Arc<dyn ChatModel>>,
    session_store: Option<Arc<dyn SessionStore>>,
    tools: ToolRegistry,
    context_providers: Vec<Arc<dyn ContextProvider>>,
    rules: Vec<FlowRule>,
    schema: Option<Schema>,
    config: EngineConfig,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            model: None,
            session_store: None,
            tools: ToolRegistry::new(),
            context_providers: Vec::new(),
            rules: Vec::new(),
            schema: None,
            config: EngineConfig::default(),
        }
    }

    pub fn with_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.config.model_id = model_id.into();
        self
    }

    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    pub fn with_tool(self, tool: Arc<dyn Tool>) -> Self {
        self.tools.register(tool).expect("duplicate tool name");
        self
    }

    pub fn with_context_provider(mut self, provider: Arc<dyn ContextProvider>) -> Self {
        self.context_providers.push(provider);
        self
    }

    pub fn with_flow_rule(mut self, rule: FlowRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    pub fn build(self) -> BasicAgent {
        let model = self.model.expect("AgentBuilder requires with_model before build()");
        let session_store: Arc<dyn SessionStore> = self.session_store.unwrap_or_else(|| {
            let store: Arc<dyn SessionStore> = InMemorySessionStore::new();
            store
        });

        let engine = Engine::new(
            session_store.clone(),
            Arc::new(self.tools),
            model,
            self.context_providers,
            FlowEngine::new(self.rules),
            self.schema,
            self.config,
        );

        BasicAgent { engine: Arc::new(engine), session_store }
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A ready-to-use agent: create a session, then send it turns.
///
/// This is the fluent surface. Callers who want the turn-by-turn loop
/// exposed directly (custom session lifecycle, their own cancellation
/// wiring, multiple engines sharing one store) should build an
/// `agentflow_engine::Engine` themselves instead — `BasicAgent` is a thin
/// convenience wrapper around exactly that type.
pub struct BasicAgent {
    engine: Arc<Engine>,
    session_store: Arc<dyn SessionStore>,
}

impl BasicAgent {
    /// Create a fresh session and return its id.
    pub async fn new_session(&self) -> agentflow_types::error::Result<String> {
        let cancel = CancellationToken::new();
        let session = self.session_store.create(CreateOptions::default(), &cancel).await?;
        Ok(session.id)
    }

    /// Create a session with caller-chosen options (explicit id, TTL, seed
    /// metadata) and return it.
    pub async fn new_session_with(&self, opts: CreateOptions) -> agentflow_types::error::Result<Session> {
        let cancel = CancellationToken::new();
        self.session_store.create(opts, &cancel).await
    }

    /// Run one turn against an existing session, with no cancellation.
    pub async fn chat(&self, session_id: &str, input: &str) -> Result<TurnOutcome> {
        self.chat_cancellable(session_id, input, &CancellationToken::new()).await
    }

    /// Run one turn, honoring the given cancellation token at every
    /// suspension point (model call, each tool dispatch, session save).
    pub async fn chat_cancellable(
        &self,
        session_id: &str,
        input: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome> {
        self.engine.chat(session_id, input, cancel).await
    }

    /// Escape hatch to the underlying engine, for callers who started with
    /// `BasicAgent` but need a capability it doesn't expose.
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }
}
