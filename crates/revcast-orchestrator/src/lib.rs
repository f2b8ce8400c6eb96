//! The Revcast crew: three agents run sequentially over a dependency-ordered
//! task queue.
//!
//! # Main types
//!
//! - [`Crew`]: Runs the tasks with one agent per role and collects outputs.
//! - [`TaskQueue`]: Dependency-aware queue with cycle detection.
//! - [`AgentProfile`]: Role, goal and backstory of one agent.
//! - [`CrewOutput`]: Final output plus every task's output.

/// Crew execution.
pub mod engine;
/// Built-in agent profiles and task definitions.
pub mod profiles;
/// Dependency-aware task queue.
pub mod task_queue;
/// Shared crew types.
pub mod types;

pub use engine::{BackendFactory, Crew};
pub use profiles::{default_profiles, default_tasks, interpolate};
pub use task_queue::TaskQueue;
pub use types::{AgentProfile, AgentRole, CrewOutput, Task, TaskOutput, TaskStatus};
