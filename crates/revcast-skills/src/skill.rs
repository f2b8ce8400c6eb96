use async_trait::async_trait;
use revcast_core::{RevcastResult, ToolCall, ToolResult};
use serde::{Deserialize, Serialize};

/// Metadata describing a skill's interface, as advertised to the LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDescriptor {
    /// Tool name the LLM calls.
    pub name: String,
    /// What the tool does, in the LLM's terms.
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters_schema: serde_json::Value,
}

/// A tool an agent can invoke.
///
/// Failures the LLM should see and react to are returned as error
/// [`ToolResult`]s; `Err` is reserved for failures of the runtime itself.
#[async_trait]
pub trait Skill: Send + Sync {
    /// Interface metadata.
    fn descriptor(&self) -> &SkillDescriptor;

    /// Run the tool.
    async fn execute(&self, call: ToolCall) -> RevcastResult<ToolResult>;
}
