use crate::types::{AgentProfile, AgentRole, Task};
use revcast_agent::ModelConfig;
use revcast_core::{RevcastError, RevcastResult};
use revcast_skills::FORECAST_SKILL_NAME;
use std::collections::HashMap;

/// The three crew agents, using `base` as the model template.
pub fn default_profiles(base: &ModelConfig) -> Vec<AgentProfile> {
    vec![
        AgentProfile {
            role: AgentRole::LogisticsAnalyst,
            goal: "Analyze logistical challenges and identify the core issues".to_string(),
            backstory: "With a Ph.D. in Supply Chain Management and over 15 years of \
                        experience, you are a master at dissecting complex logistics problems."
                .to_string(),
            model: base.clone(),
            allowed_skills: Vec::new(),
            max_turns: base.max_turns,
        },
        AgentProfile {
            role: AgentRole::SolutionArchitect,
            goal: "Design innovative and practical solutions for logistics challenges".to_string(),
            backstory: "You are a visionary architect blending technology, process \
                        optimization, and strategic thinking. Your solutions are scalable \
                        and actionable."
                .to_string(),
            model: base.clone(),
            allowed_skills: Vec::new(),
            max_turns: base.max_turns,
        },
        AgentProfile {
            role: AgentRole::FinancialForecaster,
            goal: "Generate accurate revenue and budget forecasts".to_string(),
            backstory: "A financial expert specializing in predictive analytics and \
                        forecasting models. You rely on statistical tools to produce \
                        reliable projections."
                .to_string(),
            model: base.clone(),
            allowed_skills: vec![FORECAST_SKILL_NAME.to_string()],
            max_turns: base.max_turns,
        },
    ]
}

/// Analysis, solution design (fed by the analysis) and the forecast.
///
/// The forecast task needs a `file_path` kickoff input.
pub fn default_tasks() -> Vec<Task> {
    let analysis = Task::new(
        "analysis",
        "A major e-commerce client is struggling with last-mile delivery. Delivery times \
         are inconsistent and fuel costs increased by 20%. Analyze this problem and \
         provide three root causes.",
        "Bullet points with 3 root causes and explanations.",
        AgentRole::LogisticsAnalyst,
    );

    let solution = Task::new(
        "solution",
        "Using the analysis, design a solution to reduce delivery times by 15% and cut \
         fuel costs by 10%. Propose specific actions.",
        "Actionable strategic plan with clear steps and outcomes.",
        AgentRole::SolutionArchitect,
    )
    .with_dependencies(vec![analysis.id]);

    let forecast = Task::new(
        "forecast",
        "Take the uploaded Excel file at {file_path} and generate a 12-month revenue and \
         budget forecast. Call the revenue_forecast tool with that file path and answer \
         with the tool's JSON output unchanged.",
        "A 12-row JSON with ds, yhat, yhat_lower, yhat_upper fields.",
        AgentRole::FinancialForecaster,
    );

    vec![analysis, solution, forecast]
}

/// Fill `{key}` placeholders in `template` from `inputs`.
///
/// A placeholder with no matching input is an error; braces that do not
/// enclose an identifier (JSON examples, for instance) are left alone.
pub fn interpolate(template: &str, inputs: &HashMap<String, String>) -> RevcastResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let key_len = after
            .find('}')
            .filter(|&end| end > 0 && after[..end].chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));

        match key_len {
            Some(end) => {
                let key = &after[..end];
                let value = inputs.get(key).ok_or_else(|| {
                    RevcastError::Orchestrator(format!("missing kickoff input '{key}'"))
                })?;
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}
