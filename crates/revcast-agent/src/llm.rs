use crate::backends::claude::ClaudeBackend;
use crate::backends::LlmBackend;
use crate::config::{LlmProvider, ModelConfig};
use revcast_core::{Message, RevcastResult, ToolCall};
use revcast_skills::SkillDescriptor;

/// Response from the LLM: text, or a request to call tools.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmResponse {
    /// Intermediate text; the model stopped for a reason other than finishing.
    Text(String),
    /// The model wants tools run before it continues.
    ToolUse {
        /// Text emitted alongside the tool calls.
        content: Option<String>,
        /// Requested calls, in order.
        tool_calls: Vec<ToolCall>,
    },
    /// Final answer.
    Done(String),
}

/// LLM client that dispatches to the configured provider backend.
pub struct LlmClient {
    backend: Box<dyn LlmBackend>,
}

impl LlmClient {
    /// Client for the provider named in `config`.
    pub fn new(config: ModelConfig) -> RevcastResult<Self> {
        let backend: Box<dyn LlmBackend> = match config.provider {
            LlmProvider::Claude => Box::new(ClaudeBackend::new(config)?),
        };
        Ok(Self { backend })
    }

    /// Create from a pre-built backend.
    pub fn from_backend(backend: Box<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// Chat completion.
    pub async fn chat(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
        tools: &[SkillDescriptor],
    ) -> RevcastResult<LlmResponse> {
        self.backend.chat(system_prompt, messages, tools).await
    }
}
