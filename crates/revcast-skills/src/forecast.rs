use crate::skill::{Skill, SkillDescriptor};
use async_trait::async_trait;
use revcast_core::{ForecastError, RevcastResult, ToolCall, ToolResult};
use revcast_pipeline::{ForecastPipeline, Forecaster, PipelineConfig};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Tool name advertised to the LLM.
pub const FORECAST_SKILL_NAME: &str = "revenue_forecast";

/// Reads a revenue workbook, validates it and asks the forecaster for a
/// forecast. The forecaster's output is returned verbatim as the tool result.
pub struct ForecastSkill {
    descriptor: SkillDescriptor,
    defaults: PipelineConfig,
    forecaster: Arc<dyn Forecaster>,
}

impl ForecastSkill {
    /// Skill using `defaults` for any argument the LLM omits.
    pub fn new(defaults: PipelineConfig, forecaster: Arc<dyn Forecaster>) -> Self {
        Self {
            descriptor: SkillDescriptor {
                name: FORECAST_SKILL_NAME.to_string(),
                description: format!(
                    "Generate a {}-period revenue and budget forecast from an Excel (.xlsx/.xls) \
                     dataset. Returns JSON records with ds, yhat, yhat_lower and yhat_upper.",
                    defaults.periods
                ),
                parameters_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "file_path": {
                            "type": "string",
                            "description": "Path to the uploaded Excel workbook"
                        },
                        "date_col": {
                            "type": "string",
                            "description": format!("Column with dates (default '{}')", defaults.date_column)
                        },
                        "value_col": {
                            "type": "string",
                            "description": format!("Column with revenue/budget values (default '{}')", defaults.value_column)
                        },
                        "periods": {
                            "type": "integer",
                            "minimum": 1,
                            "description": format!("Future periods to forecast (default {})", defaults.periods)
                        }
                    },
                    "required": ["file_path"]
                }),
            },
            defaults,
            forecaster,
        }
    }

    fn config_for(&self, call: &ToolCall) -> PipelineConfig {
        let mut config = self.defaults.clone();
        if let Some(date_col) = call.str_arg("date_col") {
            config.date_column = date_col.to_string();
        }
        if let Some(value_col) = call.str_arg("value_col") {
            config.value_column = value_col.to_string();
        }
        if let Some(periods) = call.arguments["periods"]
            .as_u64()
            .and_then(|p| u32::try_from(p).ok())
            .filter(|p| *p > 0)
        {
            config.periods = periods;
        }
        config
    }

    async fn forecast(&self, file_path: &str, config: &PipelineConfig) -> Result<String, ForecastError> {
        let pipeline = ForecastPipeline::new(config);
        let observations = pipeline.load_observations(Path::new(file_path))?;
        let raw = self
            .forecaster
            .forecast(&pipeline.request_for(observations))
            .await?;
        Ok(raw.into_text())
    }
}

fn error_payload(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

#[async_trait]
impl Skill for ForecastSkill {
    fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }

    async fn execute(&self, call: ToolCall) -> RevcastResult<ToolResult> {
        let Some(file_path) = call.str_arg("file_path") else {
            return Ok(ToolResult::error(
                &call.id,
                error_payload("file_path argument is required"),
            ));
        };

        let config = self.config_for(&call);
        info!(
            file = %file_path,
            date_col = %config.date_column,
            value_col = %config.value_column,
            periods = config.periods,
            "Running forecast skill"
        );

        match self.forecast(file_path, &config).await {
            Ok(output) => Ok(ToolResult::success(&call.id, output)),
            Err(e) => {
                warn!(error = %e, stage = %e.stage(), "Forecast skill failed");
                Ok(ToolResult::error(&call.id, error_payload(&e.user_message())))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use revcast_pipeline::{ForecastRequest, RawForecast};

    struct Unreachable;

    #[async_trait]
    impl Forecaster for Unreachable {
        async fn forecast(&self, _request: &ForecastRequest) -> Result<RawForecast, ForecastError> {
            panic!("forecaster must not be called");
        }
    }

    fn skill() -> ForecastSkill {
        ForecastSkill::new(PipelineConfig::default(), Arc::new(Unreachable))
    }

    fn call(arguments: serde_json::Value) -> ToolCall {
        ToolCall {
            id: "toolu_1".into(),
            name: FORECAST_SKILL_NAME.into(),
            arguments,
        }
    }

    #[test]
    fn test_descriptor() {
        let skill = skill();
        assert_eq!(skill.descriptor().name, "revenue_forecast");
        assert_eq!(skill.descriptor().parameters_schema["required"][0], "file_path");
        assert!(skill.descriptor().description.contains("12-period"));
    }

    #[test]
    fn test_arguments_override_defaults() {
        let config = skill().config_for(&call(serde_json::json!({
            "file_path": "/tmp/x.xlsx",
            "date_col": "Month",
            "value_col": "Budget",
            "periods": 6,
        })));
        assert_eq!(config.date_column, "Month");
        assert_eq!(config.value_column, "Budget");
        assert_eq!(config.periods, 6);

        let config = skill().config_for(&call(serde_json::json!({"periods": 0})));
        assert_eq!(config.periods, 12);
        assert_eq!(config.date_column, "Date");
    }

    #[tokio::test]
    async fn test_missing_file_path() {
        let result = skill().execute(call(serde_json::json!({}))).await.unwrap();
        assert!(result.is_error);
        let body: serde_json::Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(body["error"], "file_path argument is required");
    }

    #[tokio::test]
    async fn test_unsupported_file_is_error_result() {
        let result = skill()
            .execute(call(serde_json::json!({"file_path": "/tmp/history.csv"})))
            .await
            .unwrap();
        assert!(result.is_error);
        assert_eq!(result.call_id, "toolu_1");
        let body: serde_json::Value = serde_json::from_str(&result.content).unwrap();
        assert!(body["error"].as_str().unwrap().contains("during upload"));
    }
}
