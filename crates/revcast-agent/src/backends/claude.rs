use super::LlmBackend;
use crate::config::ModelConfig;
use crate::llm::LlmResponse;
use async_trait::async_trait;
use revcast_core::{Message, RevcastError, RevcastResult, Role, ToolCall};
use revcast_skills::SkillDescriptor;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Claude (Anthropic) API backend.
pub struct ClaudeBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl ClaudeBackend {
    /// Backend for `config`.
    pub fn new(config: ModelConfig) -> RevcastResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RevcastError::Http(e.to_string()))?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl LlmBackend for ClaudeBackend {
    async fn chat(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
        tools: &[SkillDescriptor],
    ) -> RevcastResult<LlmResponse> {
        let url = format!("{}/v1/messages", self.config.base_url());

        let api_messages: Vec<ClaudeMessage> = messages
            .iter()
            .filter(|m| m.role != Role::System && !m.content.trim().is_empty())
            .map(|m| ClaudeMessage {
                role: match m.role {
                    Role::Assistant => "assistant",
                    _ => "user",
                },
                content: &m.content,
            })
            .collect();

        let claude_tools: Vec<ClaudeTool> = tools
            .iter()
            .map(|t| ClaudeTool {
                name: &t.name,
                description: &t.description,
                input_schema: &t.parameters_schema,
            })
            .collect();

        let mut body = serde_json::json!({
            "model": self.config.model_id,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": api_messages,
        });

        if let Some(sys) = system_prompt {
            body["system"] = serde_json::json!(sys);
        }

        if !claude_tools.is_empty() {
            body["tools"] = serde_json::to_value(&claude_tools)?;
        }

        debug!(model = %self.config.model_id, messages = api_messages.len(), tools = claude_tools.len(), "Calling Claude");

        let resp = self
            .http
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| RevcastError::Http(e.to_string()))?;

        let status = resp.status();
        let resp_body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| RevcastError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(RevcastError::Http(format!(
                "Claude API error {status}: {resp_body}"
            )));
        }

        parse_claude_response(&resp_body)
    }
}

// -- Claude wire types --

#[derive(Serialize)]
struct ClaudeMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ClaudeTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a serde_json::Value,
}

/// Interpret a Messages API response body.
pub fn parse_claude_response(body: &serde_json::Value) -> RevcastResult<LlmResponse> {
    let content = body["content"]
        .as_array()
        .ok_or_else(|| RevcastError::Agent("Missing content in Claude response".into()))?;

    let mut text_parts = Vec::new();
    let mut tool_calls = Vec::new();

    for block in content {
        match block["type"].as_str() {
            Some("text") => {
                if let Some(t) = block["text"].as_str() {
                    text_parts.push(t.to_string());
                }
            }
            Some("tool_use") => tool_calls.push(ToolCall {
                id: block["id"].as_str().unwrap_or_default().to_string(),
                name: block["name"].as_str().unwrap_or_default().to_string(),
                arguments: block["input"].clone(),
            }),
            _ => {}
        }
    }

    if !tool_calls.is_empty() {
        return Ok(LlmResponse::ToolUse {
            content: (!text_parts.is_empty()).then(|| text_parts.join("\n")),
            tool_calls,
        });
    }

    let text = text_parts.join("\n");
    match body["stop_reason"].as_str().unwrap_or("end_turn") {
        "end_turn" | "stop_sequence" => Ok(LlmResponse::Done(text)),
        _ => Ok(LlmResponse::Text(text)),
    }
}
