/// Anthropic Messages API.
pub mod claude;

use crate::llm::LlmResponse;
use async_trait::async_trait;
use revcast_core::{Message, RevcastResult};
use revcast_skills::SkillDescriptor;

/// Trait for LLM provider backends.
///
/// To add a provider, implement this trait in a new module, add a variant to
/// [`LlmProvider`](crate::config::LlmProvider) and wire it in
/// [`LlmClient::new`](crate::llm::LlmClient::new).
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Chat completion.
    async fn chat(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
        tools: &[SkillDescriptor],
    ) -> RevcastResult<LlmResponse>;
}
