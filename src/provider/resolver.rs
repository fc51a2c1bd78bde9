// src/provider/resolver.rs — Pick a provider from config and environment

use std::sync::Arc;

use super::anthropic::AnthropicProvider;
use super::openai::OpenAiProvider;
use super::ModelProvider;
use crate::infra::config::ModelConfig;
use crate::infra::errors::IssueCostError;

/// Resolve the configured provider. When no provider is named, the
/// first available API key wins (Anthropic, then OpenAI).
pub fn from_config(config: &ModelConfig) -> Result<Arc<dyn ModelProvider>, IssueCostError> {
    let anthropic_key = non_empty_env("ANTHROPIC_API_KEY");
    let openai_key = non_empty_env("OPENAI_API_KEY");

    let provider = config.provider.as_deref().map(str::to_lowercase);
    match provider.as_deref() {
        Some("anthropic") => {
            let key = anthropic_key.ok_or(IssueCostError::NoProvider)?;
            Ok(Arc::new(AnthropicProvider::new(key, config.model.clone())))
        }
        Some("openai") => {
            let key = openai_key.ok_or(IssueCostError::NoProvider)?;
            Ok(Arc::new(OpenAiProvider::new(key, config.model.clone())))
        }
        Some(other) => Err(IssueCostError::Config(format!(
            "unknown model provider '{other}' (expected 'anthropic' or 'openai')"
        ))),
        None => {
            if let Some(key) = anthropic_key {
                Ok(Arc::new(AnthropicProvider::new(key, config.model.clone())))
            } else if let Some(key) = openai_key {
                Ok(Arc::new(OpenAiProvider::new(key, config.model.clone())))
            } else {
                Err(IssueCostError::NoProvider)
            }
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_is_config_error() {
        let config = ModelConfig {
            provider: Some("llama-on-a-toaster".into()),
            ..Default::default()
        };
        assert!(matches!(
            from_config(&config),
            Err(IssueCostError::Config(_))
        ));
    }
}
