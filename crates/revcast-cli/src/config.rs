use anyhow::Context;
use revcast_agent::ModelConfig;
use revcast_gateway::GatewayConfig;
use revcast_pipeline::{ForecasterConfig, PipelineConfig};
use serde::Deserialize;
use std::path::Path;

/// Environment variable consulted when `[model].api_key` is empty.
pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// Contents of `revcast.toml`. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct RevcastConfig {
    /// LLM settings shared by the crew agents.
    #[serde(default)]
    pub model: ModelConfig,
    /// Input columns, horizon and rename table.
    #[serde(default)]
    pub forecast: PipelineConfig,
    /// External forecaster endpoint.
    #[serde(default)]
    pub forecaster: ForecasterConfig,
    /// Gateway listen address and limits.
    #[serde(default)]
    pub server: GatewayConfig,
}

impl RevcastConfig {
    /// Parse a config document.
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read `path`, then fill the api key from `api_key` if the file left it empty.
    pub async fn load(path: &Path, api_key: Option<String>) -> anyhow::Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let mut config = Self::from_toml_str(&text)
            .with_context(|| format!("Invalid config file '{}'", path.display()))?;
        config.model.fill_api_key(api_key);
        Ok(config)
    }

    /// Whether the crew can reach its model.
    pub fn has_api_key(&self) -> bool {
        !self.model.api_key.is_empty()
    }
}
