//! Agentic loop tests with a scripted backend and a wiremock Claude endpoint.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use revcast_agent::backends::LlmBackend;
use revcast_agent::{AgentRunner, LlmResponse, ModelConfig};
use revcast_core::{Message, RevcastError, RevcastResult, Role, ToolCall, ToolResult};
use revcast_skills::{Skill, SkillDescriptor, SkillRegistry};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// Scripted backend: replays responses and records what it was sent
// ---------------------------------------------------------------------------

struct ScriptedBackend {
    responses: Mutex<Vec<LlmResponse>>,
    seen: Arc<Mutex<Vec<Vec<Message>>>>,
    offered: Arc<Mutex<Vec<String>>>,
}

impl ScriptedBackend {
    fn new(mut responses: Vec<LlmResponse>) -> Self {
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            seen: Arc::new(Mutex::new(Vec::new())),
            offered: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn chat(
        &self,
        _system_prompt: Option<&str>,
        messages: &[Message],
        tools: &[SkillDescriptor],
    ) -> RevcastResult<LlmResponse> {
        self.seen.lock().unwrap().push(messages.to_vec());
        *self.offered.lock().unwrap() = tools.iter().map(|t| t.name.clone()).collect();
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(LlmResponse::Text("...".into())))
    }
}

struct Upper(SkillDescriptor);

#[async_trait]
impl Skill for Upper {
    fn descriptor(&self) -> &SkillDescriptor {
        &self.0
    }

    async fn execute(&self, call: ToolCall) -> RevcastResult<ToolResult> {
        let text = call.str_arg("text").unwrap_or_default().to_uppercase();
        Ok(ToolResult::success(call.id, text))
    }
}

fn registry() -> Arc<SkillRegistry> {
    let mut registry = SkillRegistry::new();
    registry.register(Arc::new(Upper(SkillDescriptor {
        name: "upper".into(),
        description: "uppercases text".into(),
        parameters_schema: serde_json::json!({"type": "object"}),
    })));
    Arc::new(registry)
}

fn tool_call(name: &str) -> LlmResponse {
    LlmResponse::ToolUse {
        content: Some("calling a tool".into()),
        tool_calls: vec![ToolCall {
            id: "toolu_1".into(),
            name: name.into(),
            arguments: serde_json::json!({"text": "revenue"}),
        }],
    }
}

// ---------------------------------------------------------------------------
// Loop behavior
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tool_result_is_backfilled_before_final_answer() {
    let backend = ScriptedBackend::new(vec![tool_call("upper"), LlmResponse::Done("REVENUE".into())]);
    let seen = backend.seen.clone();
    let offered = backend.offered.clone();
    let runner = AgentRunner::from_backend(Box::new(backend), registry(), 5);

    let answer = runner
        .run("You are a forecaster.", "Uppercase 'revenue'.", &["upper".into()])
        .await
        .unwrap();
    assert_eq!(answer, "REVENUE");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    let second_turn = &seen[1];
    let backfill = second_turn.last().unwrap();
    assert_eq!(backfill.role, Role::Tool);
    let body: serde_json::Value = serde_json::from_str(&backfill.content).unwrap();
    assert_eq!(body["tool_use_id"], "toolu_1");
    assert_eq!(body["content"], "REVENUE");
    assert_eq!(body["is_error"], false);
    assert_eq!(*offered.lock().unwrap(), vec!["upper".to_string()]);
}

#[tokio::test]
async fn disallowed_skill_is_refused() {
    let backend = ScriptedBackend::new(vec![tool_call("upper"), LlmResponse::Done("ok".into())]);
    let seen = backend.seen.clone();
    let offered = backend.offered.clone();
    let runner = AgentRunner::from_backend(Box::new(backend), registry(), 5);

    runner.run("sys", "task", &[]).await.unwrap();

    assert!(offered.lock().unwrap().is_empty());
    let seen = seen.lock().unwrap();
    let body: serde_json::Value =
        serde_json::from_str(&seen[1].last().unwrap().content).unwrap();
    assert_eq!(body["is_error"], true);
    assert!(body["content"].as_str().unwrap().contains("not available"));
}

#[tokio::test]
async fn pinned_argument_cannot_be_overridden() {
    let call_with = |text: &str| LlmResponse::ToolUse {
        content: None,
        tool_calls: vec![ToolCall {
            id: format!("toolu_{text}"),
            name: "upper".into(),
            arguments: serde_json::json!({"text": text}),
        }],
    };
    let backend = ScriptedBackend::new(vec![
        call_with("payroll"),
        call_with("revenue"),
        LlmResponse::Done("ok".into()),
    ]);
    let seen = backend.seen.clone();
    let runner = AgentRunner::from_backend(Box::new(backend), registry(), 5)
        .with_pinned_arguments(HashMap::from([("text".to_string(), "revenue".to_string())]));

    runner.run("sys", "task", &["upper".into()]).await.unwrap();

    let seen = seen.lock().unwrap();
    let result = |turn: usize| -> serde_json::Value {
        serde_json::from_str(&seen[turn].last().unwrap().content).unwrap()
    };
    assert_eq!(result(1)["is_error"], true);
    assert_eq!(
        result(1)["content"],
        "Argument 'text' must be 'revenue' for this task"
    );
    assert_eq!(result(2)["is_error"], false);
    assert_eq!(result(2)["content"], "REVENUE");
}

#[tokio::test]
async fn turn_limit_is_an_agent_error() {
    let backend = ScriptedBackend::new(Vec::new());
    let runner = AgentRunner::from_backend(Box::new(backend), registry(), 3);
    let err = runner.run("sys", "task", &[]).await.unwrap_err();
    assert!(matches!(err, RevcastError::Agent(_)));
    assert!(err.to_string().contains("3 turns"));
}

// ---------------------------------------------------------------------------
// Claude backend over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn claude_backend_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": [{"type": "text", "text": "1. Routing\n2. Fleet\n3. Fuel"}],
            "stop_reason": "end_turn"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = ModelConfig {
        api_key: "sk-test".into(),
        api_base_url: Some(server.uri()),
        ..ModelConfig::default()
    };
    let runner = AgentRunner::new(config, registry()).unwrap();
    let answer = runner.run("Analyst", "Find three root causes.", &[]).await.unwrap();
    assert!(answer.starts_with("1. Routing"));
}

#[tokio::test]
async fn claude_api_error_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "type": "error",
            "error": {"type": "authentication_error", "message": "invalid x-api-key"}
        })))
        .mount(&server)
        .await;

    let config = ModelConfig {
        api_base_url: Some(server.uri()),
        ..ModelConfig::default()
    };
    let runner = AgentRunner::new(config, registry()).unwrap();
    let err = runner.run("sys", "task", &[]).await.unwrap_err();
    match err {
        RevcastError::Http(msg) => assert!(msg.contains("401")),
        other => panic!("unexpected error: {other:?}"),
    }
}
