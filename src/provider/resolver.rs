// src/provider/resolver.rs — Build the configured provider

use std::sync::Arc;

use super::openai_compat::OpenAICompatProvider;
use super::retry::RetryProvider;
use super::ModelProvider;
use crate::infra::config::ModelConfig;
use crate::infra::errors::LiftError;

/// Providers that run locally and accept requests without a key.
const KEYLESS_PROVIDERS: &[&str] = &["ollama", "local", "lmstudio"];

/// Resolve the provider described by `[model]`, wrapped in retry.
pub fn build_provider(config: &ModelConfig) -> Result<Arc<dyn ModelProvider>, LiftError> {
    build_provider_with(config, |key| std::env::var(key).ok())
}

fn build_provider_with(
    config: &ModelConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Arc<dyn ModelProvider>, LiftError> {
    let api_key = if config.api_key_env.is_empty() {
        None
    } else {
        lookup(&config.api_key_env).filter(|k| !k.trim().is_empty())
    };

    let keyless = KEYLESS_PROVIDERS.contains(&config.provider.as_str());
    if api_key.is_none() && !keyless && !config.api_key_env.is_empty() {
        return Err(LiftError::NoProvider {
            env_var: config.api_key_env.clone(),
        });
    }

    tracing::debug!(
        provider = %config.provider,
        model = %config.model,
        base_url = %config.base_url,
        "resolved model provider"
    );

    let inner: Arc<dyn ModelProvider> = Arc::new(OpenAICompatProvider::new(
        config.provider.clone(),
        display_name(&config.provider),
        api_key,
        config.base_url.clone(),
    ));
    Ok(Arc::new(RetryProvider::new(inner)))
}

fn display_name(provider: &str) -> String {
    match provider {
        "openai" => "OpenAI".into(),
        "groq" => "Groq".into(),
        "together" => "Together".into(),
        "openrouter" => "OpenRouter".into(),
        "ollama" => "Ollama".into(),
        other => other.to_string(),
    }
}
