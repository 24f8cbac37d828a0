use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use agentflow_context::ContextProvider;
use agentflow_flow::{FlowEngine, TurnContext};
use agentflow_providers::{ChatModel, ToolChoice};
use agentflow_schema::{extract_fields, parse_structured_output, Schema, StructuredParseOutcome};
use agentflow_sessions::SessionStore;
use agentflow_tools::{DispatchOutcome, ToolContext, ToolRegistry};
use agentflow_types::message::ChatMessage;
use agentflow_types::session::{HistoryEntry, Session};
use agentflow_types::Role;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::outcome::{TurnMetadata, TurnOutcome};

/// Ties session storage, context assembly, flow rules, tool dispatch, and
/// the chat model together into one conversational turn.
pub struct Engine {
    session_store: Arc<dyn SessionStore>,
    tools: Arc<ToolRegistry>,
    model: Arc<dyn ChatModel>,
    context_providers: Vec<Arc<dyn ContextProvider>>,
    flow: FlowEngine,
    schema: Option<Schema>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        session_store: Arc<dyn SessionStore>,
        tools: Arc<ToolRegistry>,
        model: Arc<dyn ChatModel>,
        context_providers: Vec<Arc<dyn ContextProvider>>,
        flow: FlowEngine,
        schema: Option<Schema>,
        config: EngineConfig,
    ) -> Self {
        Self { session_store, tools, model, context_providers, flow, schema, config }
    }

    /// Run one turn: append the user's input to the session, loop model
    /// calls and tool dispatches until the model returns a final message
    /// or `max_iterations` is reached, then persist the session.
    pub async fn chat(
        &self,
        session_id: &str,
        user_input: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled { partial: None });
        }

        let mut session = self.session_store.get(session_id, cancel).await?;
        session.append(HistoryEntry::message(Role::User, user_input));
        self.opportunistically_extract(&mut session, user_input);

        let mut telemetry_conditions = 0usize;
        let mut telemetry_rules = 0usize;
        let mut last_assistant_text: Option<String> = None;
        let mut final_message: Option<String> = None;
        let mut iterations_used = 0usize;

        for iteration in 0..self.config.max_iterations {
            iterations_used = iteration + 1;
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled { partial: last_assistant_text });
            }

            let mut turn_ctx = TurnContext::new();
            turn_ctx.iteration = iteration;
            self.flow.evaluate(&mut session, user_input, &mut turn_ctx);
            telemetry_conditions += turn_ctx.telemetry.conditions_evaluated;
            telemetry_rules += turn_ctx.telemetry.rules_fired;

            let messages = self.assemble_messages(&session, &turn_ctx);
            let tool_defs = self.tools.definitions();
            let tool_choice = match &turn_ctx.recommended_tool {
                Some(name) => ToolChoice::Named(name.clone()),
                None => ToolChoice::Auto,
            };

            let response = self
                .model
                .generate(&messages, &self.config.model_id, &self.config.settings, &tool_defs, tool_choice)
                .await?;

            let has_nonempty_text = response.text.as_deref().is_some_and(|t| !t.is_empty());
            if has_nonempty_text {
                let text = response.text.clone().expect("checked above");
                session.append(HistoryEntry::message(Role::Assistant, text.clone()));
                last_assistant_text = Some(text);
            }

            if !response.has_tool_calls() {
                let text = response.text_or_empty().to_string();
                // Every turn that ends normally must close with an assistant
                // history entry (even an empty one) — the one above only
                // covers the non-empty case.
                if !has_nonempty_text {
                    session.append(HistoryEntry::message(Role::Assistant, text.clone()));
                }
                final_message = Some(text);
                break;
            }

            for call in &response.tool_calls {
                if cancel.is_cancelled() {
                    return Err(EngineError::Cancelled { partial: last_assistant_text });
                }

                let child_cancel = cancel.child_token();
                let ctx = ToolContext::new(session_id).with_cancellation_token(child_cancel.clone());
                let outcome = self.dispatch_with_timeout(&ctx, call, &child_cancel).await;
                self.record_tool_outcome(&mut session, call, outcome);
            }
        }

        let final_message = match final_message {
            Some(m) => m,
            None => {
                return Err(EngineError::MaxIterations {
                    iterations: iterations_used,
                    last_message: last_assistant_text,
                })
            }
        };

        let mut metadata = TurnMetadata {
            iterations: iterations_used,
            conditions_evaluated: telemetry_conditions,
            rules_fired: telemetry_rules,
            schema_collection: false,
            missing_fields: Vec::new(),
            structured_parse_error: None,
        };

        let mut structured = None;
        if let Some(schema) = &self.schema {
            let missing = schema.missing_fields(&session.state);
            metadata.missing_fields = missing.iter().map(|f| f.name.clone()).collect();
            metadata.schema_collection = !missing.is_empty();

            match parse_structured_output(schema, &final_message) {
                StructuredParseOutcome::Ok(value) => structured = Some(value),
                StructuredParseOutcome::Error(e) => metadata.structured_parse_error = Some(e),
            }
        }

        if let Err(e) = self.session_store.save(&session, cancel).await {
            tracing::warn!(error = %e, session_id, "failed to persist session after turn");
        }

        Ok(TurnOutcome { message: final_message, structured, metadata })
    }

    fn opportunistically_extract(&self, session: &mut Session, user_input: &str) {
        let Some(schema) = &self.schema else { return };
        for (name, value) in extract_fields(schema, user_input) {
            session.state.entry(name).or_insert(value);
        }
    }

    fn assemble_messages(&self, session: &Session, turn_ctx: &TurnContext) -> Vec<ChatMessage> {
        let mut messages = Vec::new();

        if turn_ctx.system_override {
            for instruction in &turn_ctx.system_instructions {
                messages.push(ChatMessage::system(instruction.clone()));
            }
        } else {
            for provider in &self.context_providers {
                for item in provider.provide(session) {
                    messages.push(context_item_to_message(&item));
                }
            }
            for instruction in &turn_ctx.system_instructions {
                messages.push(ChatMessage::system(instruction.clone()));
            }
        }

        if let Some(schema) = &self.schema {
            let missing = schema.missing_fields(&session.state);
            if let Some(next) = missing.first() {
                messages.push(ChatMessage::system(format!(
                    "Still need to collect the following field from the user: {} ({})",
                    next.name, next.prompt
                )));
            }
        }

        if let Some(tool_name) = &turn_ctx.recommended_tool {
            messages.push(ChatMessage::system(format!("Prefer using the `{tool_name}` tool for this step.")));
        }

        if turn_ctx.summarize_requested {
            messages.push(ChatMessage::system(
                "Before continuing, summarize the conversation so far concisely.".to_string(),
            ));
        }

        for (role, text, tool_call_id, name) in session.chronological_messages() {
            messages.push(match role {
                Role::System => ChatMessage::system(text),
                Role::User => ChatMessage::user(text),
                Role::Assistant => ChatMessage::assistant(text),
                Role::Tool => {
                    ChatMessage::tool_result(tool_call_id.unwrap_or_default(), name.unwrap_or_default(), text)
                }
            });
        }

        messages
    }

    /// Races the tool against the configured timeout, cancelling `child_cancel`
    /// (and nothing else) if the timeout wins — the outer turn's own
    /// cancellation token is untouched.
    async fn dispatch_with_timeout(
        &self,
        ctx: &ToolContext,
        call: &agentflow_types::message::ToolCall,
        child_cancel: &CancellationToken,
    ) -> DispatchOutcome {
        tokio::select! {
            outcome = self.tools.execute_call(ctx, call) => outcome,
            _ = tokio::time::sleep(self.config.tool_timeout) => {
                child_cancel.cancel();
                DispatchOutcome::ExecError(format!(
                    "tool `{}` timed out after {:?}",
                    call.function_name, self.config.tool_timeout
                ))
            }
        }
    }

    fn record_tool_outcome(
        &self,
        session: &mut Session,
        call: &agentflow_types::message::ToolCall,
        outcome: DispatchOutcome,
    ) {
        let args = ToolRegistry::parse_arguments(&call.arguments)
            .unwrap_or_else(|_| serde_json::json!({"raw": call.arguments}));
        session.append(HistoryEntry::tool_call(call.function_name.clone(), args));

        match outcome {
            DispatchOutcome::Success(value) => {
                session.append(HistoryEntry::tool_result_ok(call.function_name.clone(), value));
            }
            DispatchOutcome::NotFound => {
                tracing::warn!(tool = %call.function_name, "tool not found");
                session.append(HistoryEntry::tool_result_err(
                    call.function_name.clone(),
                    format!("tool not found: {}", call.function_name),
                ));
            }
            DispatchOutcome::ArgParseError(e) => {
                tracing::warn!(tool = %call.function_name, error = %e, "tool argument parse failed");
                session.append(HistoryEntry::tool_result_err(
                    call.function_name.clone(),
                    format!("argument parse error: {e}"),
                ));
            }
            DispatchOutcome::ExecError(e) => {
                tracing::warn!(tool = %call.function_name, error = %e, "tool execution failed");
                session.append(HistoryEntry::tool_result_err(call.function_name.clone(), e));
            }
        }
    }
}

fn context_item_to_message(item: &agentflow_context::ContextItem) -> ChatMessage {
    match item.item_type.as_str() {
        "system" => ChatMessage::system(item.text.clone()),
        "user" => ChatMessage::user(item.text.clone()),
        "assistant" => ChatMessage::assistant(item.text.clone()),
        "tool" => ChatMessage::system(item.text.clone()),
        _ => ChatMessage::system(item.text.clone()),
    }
}
