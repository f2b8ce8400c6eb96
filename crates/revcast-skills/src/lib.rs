//! Skills (tools) that crew agents can call.

/// The `revenue_forecast` skill.
pub mod forecast;
/// Name-indexed skill registry.
pub mod registry;
/// The skill trait and its descriptor.
pub mod skill;

pub use forecast::{ForecastSkill, FORECAST_SKILL_NAME};
pub use registry::SkillRegistry;
pub use skill::{Skill, SkillDescriptor};
