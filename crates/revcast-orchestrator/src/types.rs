use chrono::{DateTime, Utc};
use revcast_agent::ModelConfig;
use revcast_core::ForecastError;
use revcast_pipeline::RawForecast;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of each agent in the crew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Diagnoses logistics problems.
    LogisticsAnalyst,
    /// Designs solutions from the analysis.
    SolutionArchitect,
    /// Produces revenue and budget forecasts with the forecast skill.
    FinancialForecaster,
}

impl AgentRole {
    /// Job title used in the agent's system prompt.
    pub fn title(&self) -> &'static str {
        match self {
            AgentRole::LogisticsAnalyst => "Senior Logistics Analyst",
            AgentRole::SolutionArchitect => "Logistics Solution Architect",
            AgentRole::FinancialForecaster => "Financial Forecaster",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentRole::LogisticsAnalyst => write!(f, "logistics_analyst"),
            AgentRole::SolutionArchitect => write!(f, "solution_architect"),
            AgentRole::FinancialForecaster => write!(f, "financial_forecaster"),
        }
    }
}

/// Configuration for one crew agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Agent role.
    pub role: AgentRole,
    /// What the agent is trying to achieve.
    pub goal: String,
    /// Persona the agent speaks from.
    pub backstory: String,
    /// Model settings.
    pub model: ModelConfig,
    /// Skill names this agent may call.
    pub allowed_skills: Vec<String>,
    /// Agentic loop turn limit.
    pub max_turns: u32,
}

impl AgentProfile {
    /// System prompt assembled from title, goal and backstory.
    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role.title(),
            self.backstory,
            self.goal
        )
    }
}

/// Status of a task in the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    Pending,
    /// Assigned to its agent.
    Running,
    /// Finished with an output.
    Completed,
    /// Finished with an error.
    Failed {
        /// Why the task failed.
        reason: String,
    },
}

/// A unit of work for one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique id.
    pub id: Uuid,
    /// Short name, used in outputs and logs.
    pub name: String,
    /// Prompt template; `{key}` placeholders are filled from kickoff inputs.
    pub description: String,
    /// What a good answer looks like.
    pub expected_output: String,
    /// Agent that runs the task.
    pub assigned_to: AgentRole,
    /// Current status.
    pub status: TaskStatus,
    /// Tasks whose outputs this one needs.
    pub dependencies: Vec<Uuid>,
    /// Final answer, once completed.
    pub output: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Completion time.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// A pending task with no dependencies.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
        assigned_to: AgentRole,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            expected_output: expected_output.into(),
            assigned_to,
            status: TaskStatus::Pending,
            dependencies: Vec::new(),
            output: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Set the dependencies.
    pub fn with_dependencies(mut self, deps: Vec<Uuid>) -> Self {
        self.dependencies = deps;
        self
    }

    /// Pending with every dependency completed.
    pub fn is_ready(&self, completed_ids: &[Uuid]) -> bool {
        self.status == TaskStatus::Pending
            && self
                .dependencies
                .iter()
                .all(|dep| completed_ids.contains(dep))
    }
}

/// Output of one completed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    /// Task name.
    pub name: String,
    /// Agent that produced it.
    pub agent: AgentRole,
    /// Task prompt after interpolation.
    pub description: String,
    /// The agent's final answer.
    pub raw: String,
}

/// Result of a crew run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewOutput {
    /// Output of the last task.
    pub raw: String,
    /// Every task's output, in execution order.
    pub tasks_output: Vec<TaskOutput>,
}

impl CrewOutput {
    /// The final output as forecaster output for the pipeline. An empty
    /// result means the crew produced no data.
    pub fn into_forecast(self) -> Result<RawForecast, ForecastError> {
        if self.raw.trim().is_empty() {
            return Err(ForecastError::Unavailable(
                "no data returned from crew".to_string(),
            ));
        }
        Ok(RawForecast::Text(self.raw))
    }
}
