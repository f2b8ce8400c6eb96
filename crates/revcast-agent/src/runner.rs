use crate::backends::LlmBackend;
use crate::config::ModelConfig;
use crate::context::ContextWindow;
use crate::llm::{LlmClient, LlmResponse};
use revcast_core::{Message, RevcastError, RevcastResult, ToolCall, ToolResult};
use revcast_skills::SkillRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

const CONTEXT_MESSAGES: usize = 100;

/// The Agent Runner: orchestrates the agentic loop.
/// Prompt → LLM → ToolCall → Execute Skill → Backfill → Repeat.
pub struct AgentRunner {
    llm: LlmClient,
    skills: Arc<SkillRegistry>,
    max_turns: u32,
    pinned: HashMap<String, String>,
}

impl AgentRunner {
    /// Runner calling the provider named in `config`.
    pub fn new(config: ModelConfig, skills: Arc<SkillRegistry>) -> RevcastResult<Self> {
        let max_turns = config.max_turns;
        Ok(Self {
            llm: LlmClient::new(config)?,
            skills,
            max_turns,
            pinned: HashMap::new(),
        })
    }

    /// Runner over a pre-built backend.
    pub fn from_backend(
        backend: Box<dyn LlmBackend>,
        skills: Arc<SkillRegistry>,
        max_turns: u32,
    ) -> Self {
        Self {
            llm: LlmClient::from_backend(backend),
            skills,
            max_turns,
            pinned: HashMap::new(),
        }
    }

    /// Fix tool arguments for this run. A call passing any other value for a
    /// pinned argument is refused without reaching the skill.
    pub fn with_pinned_arguments(mut self, pinned: HashMap<String, String>) -> Self {
        self.pinned = pinned;
        self
    }

    /// Run one task to completion and return the final answer.
    ///
    /// Only the skills named in `allowed_skills` are offered to the model or
    /// executed on its behalf.
    pub async fn run(
        &self,
        system_prompt: &str,
        task_prompt: &str,
        allowed_skills: &[String],
    ) -> RevcastResult<String> {
        let conversation_id = Uuid::new_v4();
        let mut context = ContextWindow::new(CONTEXT_MESSAGES);
        context.set_system_prompt(system_prompt);
        context.push(Message::user(task_prompt, conversation_id));

        let tools = self.skills.descriptors_for(allowed_skills);

        info!(conversation_id = %conversation_id, tools = tools.len(), "Starting agentic loop");

        for turn in 0..self.max_turns {
            info!(turn = turn, "Agentic loop turn");

            let response = self
                .llm
                .chat(context.system_prompt(), context.messages(), &tools)
                .await?;

            match response {
                LlmResponse::Done(text) => {
                    context.push(Message::assistant(&text, conversation_id));
                    info!(conversation_id = %conversation_id, turns = turn + 1, "Agentic loop completed");
                    return Ok(text);
                }

                LlmResponse::Text(text) => {
                    context.push(Message::assistant(&text, conversation_id));
                }

                LlmResponse::ToolUse {
                    content,
                    tool_calls,
                } => {
                    if let Some(text) = &content {
                        context.push(Message::assistant(text, conversation_id));
                    }

                    for call in tool_calls {
                        info!(
                            conversation_id = %conversation_id,
                            tool = %call.name,
                            call_id = %call.id,
                            "Executing tool call"
                        );
                        let backfill = match self.execute(call.clone(), allowed_skills).await {
                            Ok(result) => {
                                serde_json::json!({
                                    "type": "tool_result",
                                    "tool_use_id": result.call_id,
                                    "content": result.content,
                                    "is_error": result.is_error,
                                })
                                .to_string()
                            }
                            Err(e) => {
                                error!(error = %e, tool = %call.name, "Tool execution failed");
                                format!("Tool error: {e}")
                            }
                        };
                        context.push(Message::tool(backfill, conversation_id));
                    }
                }
            }
        }

        warn!(
            conversation_id = %conversation_id,
            max_turns = self.max_turns,
            "Agentic loop reached max turns"
        );

        Err(RevcastError::Agent(format!(
            "Agentic loop exceeded maximum of {} turns",
            self.max_turns
        )))
    }

    async fn execute(&self, call: ToolCall, allowed_skills: &[String]) -> RevcastResult<ToolResult> {
        if !allowed_skills.iter().any(|s| *s == call.name) {
            warn!(tool = %call.name, "Tool call outside the agent's allowed skills");
            return Ok(ToolResult::error(
                &call.id,
                format!("Skill '{}' is not available to this agent", call.name),
            ));
        }
        let mismatch = self.pinned.iter().find(|(key, value)| {
            call.arguments
                .get(key.as_str())
                .is_some_and(|arg| arg.as_str() != Some(value.as_str()))
        });
        if let Some((key, value)) = mismatch {
            warn!(tool = %call.name, argument = %key, "Tool call overrides a pinned argument");
            return Ok(ToolResult::error(
                &call.id,
                format!("Argument '{key}' must be '{value}' for this task"),
            ));
        }
        self.skills.execute(call).await
    }
}
