//! Reference `ChatModel` binding for any OpenAI-compatible chat-completions
//! endpoint (OpenAI itself, Azure OpenAI, and the many self-hosted servers
//! that mirror the same wire format).
//!
//! The concrete wire protocol and retry/backoff policy are an external
//! collaborator as far as the runtime's own contract is concerned — this
//! adapter is the one binding the crate ships so the `ChatModel` trait has
//! something real behind it.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use agentflow_types::error::{Error, Result};
use agentflow_types::message::{AssistantMessage, ChatMessage, Role, ToolCall, ToolDefinition};

use crate::traits::{ChatModel, Settings, ToolChoice};

/// Retry/timeout policy applied around every request.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            request_timeout: Duration::from_secs(60),
        }
    }
}

pub struct OpenAiCompatProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl OpenAiCompatProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_retry_policy(base_url, api_key, RetryPolicy::default())
    }

    pub fn with_retry_policy(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
            retry,
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_body(
        &self,
        messages: &[ChatMessage],
        model_id: &str,
        settings: &Settings,
        tools: &[ToolDefinition],
        tool_choice: &ToolChoice,
    ) -> Value {
        let messages: Vec<Value> = messages.iter().map(message_to_wire).collect();
        let mut body = serde_json::json!({
            "model": model_id,
            "messages": messages,
        });

        if let Some(t) = settings.temperature {
            body["temperature"] = serde_json::json!(t);
        }
        if let Some(t) = settings.max_tokens {
            body["max_tokens"] = serde_json::json!(t);
        }
        if let Some(t) = settings.top_p {
            body["top_p"] = serde_json::json!(t);
        }
        if let Some(t) = settings.frequency_penalty {
            body["frequency_penalty"] = serde_json::json!(t);
        }
        if let Some(t) = settings.presence_penalty {
            body["presence_penalty"] = serde_json::json!(t);
        }
        if !settings.stop.is_empty() {
            body["stop"] = serde_json::json!(settings.stop);
        }

        if !tools.is_empty() {
            let wire_tools: Vec<Value> = tools.iter().map(tool_def_to_wire).collect();
            body["tools"] = serde_json::json!(wire_tools);
            body["tool_choice"] = match tool_choice {
                ToolChoice::Auto => serde_json::json!("auto"),
                ToolChoice::None => serde_json::json!("none"),
                ToolChoice::Named(name) => {
                    serde_json::json!({"type": "function", "function": {"name": name}})
                }
            };
        }

        body
    }

    async fn send_once(&self, body: &Value) -> Result<Value> {
        let resp = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::ModelTransient(e.to_string()))?;

        let status = resp.status();
        if status.is_server_error() || status.as_u16() == 429 {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::ModelTransient(format!("{status}: {text}")));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::ModelFatal(format!("{status}: {text}")));
        }

        resp.json::<Value>().await.map_err(|e| Error::ModelFatal(e.to_string()))
    }

    async fn send_with_retry(&self, body: &Value) -> Result<Value> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let call = tokio::time::timeout(self.retry.request_timeout, self.send_once(body));
            match call.await {
                Ok(Ok(v)) => return Ok(v),
                Ok(Err(Error::ModelTransient(msg))) if attempt < self.retry.max_attempts => {
                    let delay = self.retry.base_delay * 2u32.pow(attempt - 1);
                    tracing::warn!(attempt, %msg, ?delay, "transient model error, retrying");
                    tokio::time::sleep(delay).await;
                }
                Ok(Ok(_)) => unreachable!(),
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    if attempt < self.retry.max_attempts {
                        let delay = self.retry.base_delay * 2u32.pow(attempt - 1);
                        tracing::warn!(attempt, "model call timed out, retrying");
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(Error::ModelTransient(format!(
                        "timed out after {:?}",
                        self.retry.request_timeout
                    )));
                }
            }
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatProvider {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        model_id: &str,
        settings: &Settings,
        tools: &[ToolDefinition],
        tool_choice: ToolChoice,
    ) -> Result<AssistantMessage> {
        let body = self.build_body(messages, model_id, settings, tools, &tool_choice);
        let response = self.send_with_retry(&body).await?;
        parse_assistant_message(&response)
    }
}

fn message_to_wire(msg: &ChatMessage) -> Value {
    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };
    let mut wire = serde_json::json!({"role": role, "content": msg.text});
    if let Some(id) = &msg.tool_call_id {
        wire["tool_call_id"] = serde_json::json!(id);
    }
    if let Some(name) = &msg.name {
        wire["name"] = serde_json::json!(name);
    }
    wire
}

fn tool_def_to_wire(def: &ToolDefinition) -> Value {
    serde_json::json!({
        "type": "function",
        "function": {
            "name": def.name,
            "description": def.description,
            "parameters": def.parameters,
        }
    })
}

fn parse_assistant_message(response: &Value) -> Result<AssistantMessage> {
    let message = response
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| Error::ModelFatal("response has no choices[0].message".to_string()))?;

    let text = message.get("content").and_then(|c| c.as_str()).map(|s| s.to_string());

    let tool_calls = message
        .get("tool_calls")
        .and_then(|tc| tc.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|tc| {
                    let id = tc.get("id")?.as_str()?.to_string();
                    let function = tc.get("function")?;
                    let name = function.get("name")?.as_str()?.to_string();
                    let arguments = function.get("arguments")?.as_str()?.to_string();
                    Some(ToolCall { id, function_name: name, arguments })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(AssistantMessage { text, tool_calls })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_text_response() {
        let response = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "hi there"}}]
        });
        let msg = parse_assistant_message(&response).unwrap();
        assert_eq!(msg.text.as_deref(), Some("hi there"));
        assert!(msg.tool_calls.is_empty());
    }

    #[test]
    fn parses_tool_call_response() {
        let response = serde_json::json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "get_weather", "arguments": "{\"location\":\"Tokyo\"}"}
                    }]
                }
            }]
        });
        let msg = parse_assistant_message(&response).unwrap();
        assert!(msg.text.is_none());
        assert_eq!(msg.tool_calls.len(), 1);
        assert_eq!(msg.tool_calls[0].function_name, "get_weather");
    }

    #[test]
    fn missing_choices_is_a_fatal_error() {
        let response = serde_json::json!({});
        assert!(parse_assistant_message(&response).is_err());
    }

    #[test]
    fn tool_def_to_wire_nests_under_function() {
        let def = ToolDefinition {
            name: "get_weather".into(),
            description: "get the weather".into(),
            parameters: serde_json::json!({"type": "object"}),
        };
        let wire = tool_def_to_wire(&def);
        assert_eq!(wire["function"]["name"], "get_weather");
    }
}
