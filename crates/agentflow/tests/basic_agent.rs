use std::sync::Arc;

use async_trait::async_trait;

use agentflow::prelude::*;

struct StaticModel(&'static str);

#[async_trait]
impl ChatModel for StaticModel {
    async fn generate(
        &self,
        _messages: &[ChatMessage],
        _model_id: &str,
        _settings: &Settings,
        _tools: &[ToolDefinition],
        _tool_choice: ToolChoice,
    ) -> agentflow::types::error::Result<AssistantMessage> {
        Ok(AssistantMessage::text_only(self.0))
    }
}

#[tokio::test]
async fn builder_produces_a_working_agent_with_default_session_store() {
    let agent = AgentBuilder::new()
        .with_model(Arc::new(StaticModel("hello from the agent")))
        .with_context_provider(Arc::new(SystemPromptProvider::new("be helpful")))
        .build();

    let session_id = agent.new_session().await.unwrap();
    let outcome = agent.chat(&session_id, "hi").await.unwrap();
    assert_eq!(outcome.message, "hello from the agent");
}

#[test]
#[should_panic(expected = "with_model")]
fn builder_rejects_missing_model() {
    AgentBuilder::new().build();
}
