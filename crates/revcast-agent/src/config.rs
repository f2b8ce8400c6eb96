use serde::{Deserialize, Serialize};

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Anthropic Messages API.
    #[default]
    Claude,
}

/// Model settings shared by every crew agent unless a profile overrides them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider to call.
    #[serde(default)]
    pub provider: LlmProvider,
    /// Provider model identifier.
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// API key; filled from `ANTHROPIC_API_KEY` when left empty.
    #[serde(default, skip_serializing)]
    pub api_key: String,
    /// Override of the provider's API root.
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Completion token cap per call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Agentic loop turn limit.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
}

fn default_model_id() -> String {
    "claude-3-haiku-20240307".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_max_turns() -> u32 {
    10
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model_id: default_model_id(),
            api_key: String::new(),
            api_base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_turns: default_max_turns(),
        }
    }
}

impl ModelConfig {
    /// API root for the configured provider.
    pub fn base_url(&self) -> &str {
        if let Some(url) = &self.api_base_url {
            url
        } else {
            match self.provider {
                LlmProvider::Claude => "https://api.anthropic.com",
            }
        }
    }

    /// Use `key` when no api key is configured. Surrounding whitespace is
    /// trimmed, as keys pasted into `.env` files often carry a newline.
    pub fn fill_api_key(&mut self, key: Option<String>) {
        if self.api_key.trim().is_empty() {
            if let Some(key) = key {
                self.api_key = key.trim().to_string();
            }
        }
    }
}
