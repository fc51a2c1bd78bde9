// src/provider/mod.rs — Model provider layer

pub mod anthropic;
pub mod openai;
pub mod resolver;

use async_trait::async_trait;

use crate::infra::errors::IssueCostError;

/// Single-shot prompt completion against a generative-model provider.
/// Streaming and tool use are out of scope: the estimator only needs
/// one text response per issue.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> Result<String, IssueCostError>;
}

#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens: 1024,
            temperature: 0.3,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_request_defaults() {
        let r = CompletionRequest::new("estimate this");
        assert_eq!(r.prompt, "estimate this");
        assert!(r.system.is_none());
        assert_eq!(r.max_tokens, 1024);
    }

    #[test]
    fn test_completion_request_with_system() {
        let r = CompletionRequest::new("p").with_system("you are an estimator");
        assert_eq!(r.system.as_deref(), Some("you are an estimator"));
    }
}
