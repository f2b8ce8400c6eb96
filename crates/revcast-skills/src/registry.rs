use crate::skill::{Skill, SkillDescriptor};
use revcast_core::{RevcastError, RevcastResult, ToolCall, ToolResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Central registry for all available skills.
pub struct SkillRegistry {
    skills: HashMap<String, Arc<dyn Skill>>,
}

impl SkillRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            skills: HashMap::new(),
        }
    }

    /// Register a skill under its descriptor name, replacing any previous one.
    pub fn register(&mut self, skill: Arc<dyn Skill>) {
        let name = skill.descriptor().name.clone();
        info!(skill = %name, "Registered skill");
        self.skills.insert(name, skill);
    }

    /// Look up a skill by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Skill>> {
        self.skills.get(name)
    }

    /// Descriptors of every skill, sorted by name.
    pub fn list_descriptors(&self) -> Vec<&SkillDescriptor> {
        let mut descriptors: Vec<_> = self.skills.values().map(|s| s.descriptor()).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Descriptors of the named skills that are registered, in the given order.
    pub fn descriptors_for(&self, names: &[String]) -> Vec<SkillDescriptor> {
        names
            .iter()
            .filter_map(|n| {
                let found = self.skills.get(n).map(|s| s.descriptor().clone());
                if found.is_none() {
                    warn!(skill = %n, "Allowed skill is not registered");
                }
                found
            })
            .collect()
    }

    /// Execute a tool call against the named skill.
    pub async fn execute(&self, call: ToolCall) -> RevcastResult<ToolResult> {
        let skill = self
            .skills
            .get(&call.name)
            .ok_or_else(|| RevcastError::Skill(format!("Unknown skill: {}", call.name)))?;
        skill.execute(call).await
    }

    /// Number of registered skills.
    pub fn skill_count(&self) -> usize {
        self.skills.len()
    }
}

impl Default for SkillRegistry {
    fn default() -> Self {
        Self::new()
    }
}
