//! Agent runtime: model configuration, LLM backends and the agentic loop.

/// LLM provider backends.
pub mod backends;
/// Model configuration.
pub mod config;
/// Bounded conversation context.
pub mod context;
/// Provider-dispatching LLM client.
pub mod llm;
/// The agentic loop.
pub mod runner;

pub use config::{LlmProvider, ModelConfig};
pub use context::ContextWindow;
pub use llm::{LlmClient, LlmResponse};
pub use runner::AgentRunner;
