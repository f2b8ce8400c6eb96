use crate::types::{Task, TaskStatus};
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

/// A task queue with dependency resolution.
///
/// Among ready tasks, insertion order decides which runs first.
pub struct TaskQueue {
    tasks: HashMap<Uuid, Task>,
    order: Vec<Uuid>,
    completed: Vec<Uuid>,
}

impl TaskQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            order: Vec::new(),
            completed: Vec::new(),
        }
    }

    /// Add a task to the queue.
    pub fn add(&mut self, task: Task) -> Uuid {
        let id = task.id;
        if self.tasks.insert(id, task).is_none() {
            self.order.push(id);
        }
        id
    }

    /// The first ready task in insertion order.
    pub fn next_ready(&self) -> Option<&Task> {
        self.in_order().find(|t| t.is_ready(&self.completed))
    }

    /// Mark a task as running.
    pub fn mark_running(&mut self, id: Uuid) -> bool {
        self.update(id, |task| task.status = TaskStatus::Running)
    }

    /// Mark a task as completed with its output.
    pub fn mark_completed(&mut self, id: Uuid, output: String) -> bool {
        let updated = self.update(id, |task| {
            task.status = TaskStatus::Completed;
            task.output = Some(output);
            task.completed_at = Some(Utc::now());
        });
        if updated {
            self.completed.push(id);
        }
        updated
    }

    /// Mark a task as failed.
    pub fn mark_failed(&mut self, id: Uuid, reason: String) -> bool {
        self.update(id, |task| task.status = TaskStatus::Failed { reason })
    }

    /// Get a task by ID.
    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Count of pending tasks.
    pub fn pending_count(&self) -> usize {
        self.tasks
            .values()
            .filter(|t| t.status == TaskStatus::Pending)
            .count()
    }

    /// Count of completed tasks.
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Total number of tasks.
    pub fn total_count(&self) -> usize {
        self.tasks.len()
    }

    /// Whether every task is completed or failed.
    pub fn is_done(&self) -> bool {
        self.tasks
            .values()
            .all(|t| matches!(t.status, TaskStatus::Completed | TaskStatus::Failed { .. }))
    }

    /// Dependencies that name no task in the queue.
    pub fn unknown_dependencies(&self) -> Vec<Uuid> {
        self.in_order()
            .flat_map(|t| t.dependencies.iter().copied())
            .filter(|dep| !self.tasks.contains_key(dep))
            .collect()
    }

    /// Check for cycles in the dependency graph.
    pub fn has_cycle(&self) -> bool {
        let mut visited = HashMap::new();
        self.order
            .iter()
            .any(|&id| self.dfs_cycle(id, &mut visited))
    }

    fn dfs_cycle(&self, id: Uuid, visited: &mut HashMap<Uuid, u8>) -> bool {
        match visited.get(&id) {
            Some(1) => return true,
            Some(2) => return false,
            _ => {}
        }
        visited.insert(id, 1);
        if let Some(task) = self.tasks.get(&id) {
            for dep in &task.dependencies {
                if self.dfs_cycle(*dep, visited) {
                    return true;
                }
            }
        }
        visited.insert(id, 2);
        false
    }

    fn in_order(&self) -> impl Iterator<Item = &Task> {
        self.order.iter().filter_map(|id| self.tasks.get(id))
    }

    fn update(&mut self, id: Uuid, f: impl FnOnce(&mut Task)) -> bool {
        match self.tasks.get_mut(&id) {
            Some(task) => {
                f(task);
                true
            }
            None => false,
        }
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
