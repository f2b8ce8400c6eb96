//! Core types and error definitions for Revcast.
//!
//! This crate provides the foundational types shared across all Revcast crates:
//! the error taxonomy of the forecast pipeline, conversation messages, and the
//! tool call abstractions used by the agent crew.
//!
//! # Main types
//!
//! - [`RevcastError`]: Unified error enum for all Revcast subsystems.
//! - [`ForecastError`]: Terminal failures of a single forecast request.
//! - [`Stage`]: The pipeline stage a [`ForecastError`] originated in.
//! - [`Message`]: A single message within an agent conversation.
//! - [`ToolCall`] / [`ToolResult`]: LLM-initiated tool invocations.

/// Error taxonomy.
pub mod error;
/// Conversation messages.
pub mod message;
/// Tool call and tool result types.
pub mod tool;

pub use error::{ForecastError, RevcastError, RevcastResult, Stage};
pub use message::{Message, Role};
pub use tool::{ToolCall, ToolResult};
