// src/infra/config.rs — Configuration loading (TOML + environment overrides)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::types::OrchestrationConfig;
use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub orchestration: OrchestrationSection,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationSection {
    pub max_revisions: u32,
    /// Start from the best matching file in `data.templates` when one fits.
    #[serde(default)]
    pub template_bootstrap: bool,
}

impl Default for OrchestrationSection {
    fn default() -> Self {
        Self {
            max_revisions: 2,
            template_bootstrap: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider id reported in logs and errors.
    pub provider: String,
    pub model: String,
    /// Base URL of an OpenAI-compatible chat completions API.
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            model: "gpt-4o-mini".into(),
            base_url: "https://api.openai.com/v1".into(),
            api_key_env: "OPENAI_API_KEY".into(),
            temperature: 0.2,
            max_tokens: 4000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Constraint guideline table (JSON list).
    pub guidelines: String,
    /// Exercise catalog used for substitution candidates (JSON list).
    pub exercises: String,
    /// Directory of plan templates (one JSON file each).
    #[serde(default = "default_templates_dir")]
    pub templates: String,
}

fn default_templates_dir() -> String {
    "data/templates".into()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            guidelines: "data/constraints_guidelines.json".into(),
            exercises: "data/exercises.json".into(),
            templates: default_templates_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 8000 }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply LIFTLOOP_* environment overrides. Called once at startup.
    pub fn with_env_overrides(self) -> anyhow::Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        if let Some(raw) = lookup("LIFTLOOP_MAX_REVISIONS") {
            self.orchestration.max_revisions = raw.trim().parse().map_err(|_| {
                anyhow::anyhow!("LIFTLOOP_MAX_REVISIONS must be a non-negative integer, got '{raw}'")
            })?;
        }
        if let Some(raw) = lookup("LIFTLOOP_TEMPLATE_BOOTSTRAP") {
            self.orchestration.template_bootstrap =
                matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(model) = lookup("LIFTLOOP_MODEL") {
            if !model.trim().is_empty() {
                self.model.model = model.trim().to_string();
            }
        }
        Ok(self)
    }

    /// Immutable loop settings handed to the orchestrator.
    pub fn orchestration(&self) -> OrchestrationConfig {
        OrchestrationConfig {
            max_revisions: self.orchestration.max_revisions,
            template_bootstrap: self.orchestration.template_bootstrap,
        }
    }
}
