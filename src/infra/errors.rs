// src/infra/errors.rs — Error types for issuecost

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IssueCostError {
    // Request errors (rejected synchronously, never retried)
    #[error("Invalid request: {0}")]
    Validation(String),

    // Tracker errors (fatal to one repository only)
    #[error("Repository '{owner}/{name}' not found or is private")]
    RepoNotFound { owner: String, name: String },

    #[error("Rate limited by '{service}', retry after {retry_after_ms}ms")]
    RateLimited { service: String, retry_after_ms: u64 },

    #[error("Tracker API error (HTTP {status}): {message}")]
    Tracker { status: u16, message: String },

    #[error("Network error talking to '{service}': {message}")]
    Network { service: String, message: String },

    // Provider errors (absorbed by the estimator's fallback path)
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    #[error("No model provider configured. Set ANTHROPIC_API_KEY or OPENAI_API_KEY.")]
    NoProvider,

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IssueCostError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            IssueCostError::Provider {
                retriable: true,
                ..
            } | IssueCostError::RateLimited { .. }
        )
    }
}
