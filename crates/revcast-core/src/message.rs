use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a [`Message`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Task prompt or backfilled tool output.
    User,
    /// The LLM.
    Assistant,
    /// A system-level instruction.
    System,
    /// Output produced by a tool invocation.
    Tool,
}

/// One message in an agent's conversation for a single crew task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for this message.
    pub id: Uuid,
    /// The role of the message author.
    pub role: Role,
    /// The textual content of the message.
    pub content: String,
    /// The conversation (one per task execution) this message belongs to.
    pub conversation_id: Uuid,
    /// UTC timestamp of when the message was created.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a new message with the given role and content.
    pub fn new(role: Role, content: impl Into<String>, conversation_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            conversation_id,
            timestamp: Utc::now(),
        }
    }

    /// Creates a new message with [`Role::User`].
    pub fn user(content: impl Into<String>, conversation_id: Uuid) -> Self {
        Self::new(Role::User, content, conversation_id)
    }

    /// Creates a new message with [`Role::Assistant`].
    pub fn assistant(content: impl Into<String>, conversation_id: Uuid) -> Self {
        Self::new(Role::Assistant, content, conversation_id)
    }

    /// Creates a new message with [`Role::Tool`].
    pub fn tool(content: impl Into<String>, conversation_id: Uuid) -> Self {
        Self::new(Role::Tool, content, conversation_id)
    }
}
