use crate::profiles::{default_profiles, default_tasks, interpolate};
use crate::task_queue::TaskQueue;
use crate::types::{AgentProfile, AgentRole, CrewOutput, Task, TaskOutput};
use revcast_agent::backends::LlmBackend;
use revcast_agent::{AgentRunner, ModelConfig};
use revcast_core::{RevcastError, RevcastResult};
use revcast_skills::SkillRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use uuid::Uuid;

/// Builds the LLM backend for an agent. Used to run the crew against
/// something other than the provider named in the profile's model config.
pub type BackendFactory = Arc<dyn Fn(&AgentProfile) -> Box<dyn LlmBackend> + Send + Sync>;

/// A fixed set of agents and tasks, run sequentially.
///
/// Each kickoff works on its own copy of the task list, so one crew can serve
/// concurrent requests.
pub struct Crew {
    profiles: HashMap<AgentRole, AgentProfile>,
    tasks: Vec<Task>,
    skills: Arc<SkillRegistry>,
    backend_factory: Option<BackendFactory>,
}

impl Crew {
    /// The default three-agent crew over `base_config`.
    pub fn new(base_config: &ModelConfig, skills: Arc<SkillRegistry>) -> Self {
        Self::with_profiles(default_profiles(base_config), default_tasks(), skills)
    }

    /// A crew with custom profiles and tasks.
    pub fn with_profiles(
        profiles: Vec<AgentProfile>,
        tasks: Vec<Task>,
        skills: Arc<SkillRegistry>,
    ) -> Self {
        Self {
            profiles: profiles.into_iter().map(|p| (p.role, p)).collect(),
            tasks,
            skills,
            backend_factory: None,
        }
    }

    /// Build agent backends with `factory` instead of from model configs.
    pub fn with_backend_factory(mut self, factory: BackendFactory) -> Self {
        self.backend_factory = Some(factory);
        self
    }

    /// Task definitions, in execution order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Run every task and return the last task's output.
    ///
    /// `inputs` fill the `{key}` placeholders of task descriptions and pin the
    /// tool arguments of the same name. The first failing task stops the crew.
    pub async fn kickoff(&self, inputs: &HashMap<String, String>) -> RevcastResult<CrewOutput> {
        let start = Instant::now();
        let mut queue = TaskQueue::new();
        for task in &self.tasks {
            queue.add(task.clone());
        }
        if queue.has_cycle() {
            return Err(RevcastError::Orchestrator(
                "Dependency cycle detected in task graph".to_string(),
            ));
        }
        if let Some(unknown) = queue.unknown_dependencies().first() {
            return Err(RevcastError::Orchestrator(format!(
                "Task depends on unknown task {unknown}"
            )));
        }

        info!(tasks = queue.total_count(), "Crew: kickoff");

        let mut tasks_output = Vec::with_capacity(queue.total_count());
        while let Some(task) = queue.next_ready().cloned() {
            queue.mark_running(task.id);
            match self.execute_task(&task, &queue, inputs).await {
                Ok(output) => {
                    queue.mark_completed(task.id, output.raw.clone());
                    tasks_output.push(output);
                }
                Err(e) => {
                    error!(task = %task.name, role = %task.assigned_to, error = %e, "Crew task failed");
                    queue.mark_failed(task.id, e.to_string());
                    return Err(e);
                }
            }
        }

        if !queue.is_done() {
            return Err(RevcastError::Orchestrator(format!(
                "Task deadlock: {} pending task(s) with unmet dependencies",
                queue.pending_count()
            )));
        }

        info!(
            duration_ms = start.elapsed().as_millis() as u64,
            completed = queue.completed_count(),
            "Crew: finished"
        );

        let raw = tasks_output
            .last()
            .map(|o: &TaskOutput| o.raw.clone())
            .unwrap_or_default();
        Ok(CrewOutput { raw, tasks_output })
    }

    async fn execute_task(
        &self,
        task: &Task,
        queue: &TaskQueue,
        inputs: &HashMap<String, String>,
    ) -> RevcastResult<TaskOutput> {
        let profile = self.profiles.get(&task.assigned_to).ok_or_else(|| {
            RevcastError::Orchestrator(format!(
                "No profile configured for role: {}",
                task.assigned_to
            ))
        })?;

        let description = interpolate(&task.description, inputs)?;
        let prompt = task_prompt(&description, &task.expected_output, &context_for(task, queue));

        info!(task = %task.name, role = %task.assigned_to, "Executing task");

        let runner = match &self.backend_factory {
            Some(factory) => {
                AgentRunner::from_backend(factory(profile), self.skills.clone(), profile.max_turns)
            }
            None => AgentRunner::new(profile.model.clone(), self.skills.clone())?,
        }
        .with_pinned_arguments(inputs.clone());
        let raw = runner
            .run(&profile.system_prompt(), &prompt, &profile.allowed_skills)
            .await?;

        info!(task = %task.name, chars = raw.len(), "Task completed");

        Ok(TaskOutput {
            name: task.name.clone(),
            agent: task.assigned_to,
            description,
            raw,
        })
    }
}

fn context_for(task: &Task, queue: &TaskQueue) -> Vec<String> {
    task.dependencies
        .iter()
        .filter_map(|id: &Uuid| queue.get(*id))
        .filter_map(|dep| dep.output.clone())
        .collect()
}

fn task_prompt(description: &str, expected_output: &str, context: &[String]) -> String {
    let mut prompt = format!(
        "Current Task: {description}\n\n\
         This is the expected criteria for your final answer: {expected_output}\n\
         You MUST return the actual complete content as the final answer, not a summary."
    );
    if !context.is_empty() {
        prompt.push_str("\n\nThis is the context you're working with:\n");
        prompt.push_str(&context.join("\n\n----------\n\n"));
    }
    prompt
}
