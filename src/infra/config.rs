// src/infra/config.rs — Configuration loading (TOML + env overrides)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::infra::errors::IssueCostError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub github: GithubConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub estimator: EstimatorConfig,

    #[serde(default)]
    pub sessions: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            bind: "127.0.0.1".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// API token for higher rate limits. Overridden by GITHUB_TOKEN.
    pub token: Option<String>,
    pub api_base: String,
    pub per_page: u32,
    /// Safety cap on pages fetched per repository.
    pub max_pages: u32,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: "https://api.github.com".into(),
            per_page: 100,
            max_pages: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// "anthropic" or "openai". Overridden by ISSUECOST_PROVIDER.
    pub provider: Option<String>,
    /// Model ID; each provider has a sensible default.
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: None,
            model: None,
            max_tokens: 1024,
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Hours assigned when the model response cannot be parsed at all.
    pub fallback_hours: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self { fallback_hours: 8.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Terminal sessions older than this are pruned.
    pub ttl_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { ttl_minutes: 60 }
    }
}

impl Config {
    /// Load from a TOML file, falling back to defaults when absent,
    /// then apply environment overrides for secrets.
    pub fn load(path: Option<&Path>) -> Result<Self, IssueCostError> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)?;
                toml::from_str(&raw)
                    .map_err(|e| IssueCostError::Config(format!("{}: {e}", p.display())))?
            }
            None => Config::default(),
        };

        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            if !token.is_empty() {
                config.github.token = Some(token);
            }
        }
        if let Ok(provider) = std::env::var("ISSUECOST_PROVIDER") {
            if !provider.is_empty() {
                config.model.provider = Some(provider);
            }
        }

        Ok(config)
    }
}
