// src/provider/anthropic.rs — Anthropic Messages API provider

use async_trait::async_trait;

use super::{CompletionRequest, ModelProvider};
use crate::infra::errors::IssueCostError;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

pub struct AnthropicProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(api_key: String, model: Option<String>) -> Self {
        Self {
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.into()),
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self) -> &str {
        "https://api.anthropic.com/v1/messages"
    }

    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": request.prompt }],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        if let Some(system) = &request.system {
            body["system"] = serde_json::json!(system);
        }

        body
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    fn id(&self) -> &str {
        "anthropic"
    }

    fn name(&self) -> &str {
        "Anthropic"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, IssueCostError> {
        let body = self.build_request_body(&request);

        let response = self
            .client
            .post(self.api_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| IssueCostError::Provider {
                provider: "anthropic".into(),
                message: e.to_string(),
                retriable: e.is_timeout() || e.is_connect(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(IssueCostError::RateLimited {
                service: "anthropic".into(),
                retry_after_ms: 5000,
            });
        }

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(IssueCostError::Provider {
                provider: "anthropic".into(),
                message: format!("HTTP {status}: {error_body}"),
                retriable: status.is_server_error(),
            });
        }

        let json: serde_json::Value =
            response.json().await.map_err(|e| IssueCostError::Provider {
                provider: "anthropic".into(),
                message: format!("invalid response body: {e}"),
                retriable: false,
            })?;

        let content = json["content"]
            .as_array()
            .and_then(|blocks| {
                blocks
                    .iter()
                    .find(|b| b["type"] == "text")
                    .and_then(|b| b["text"].as_str())
            })
            .unwrap_or("")
            .to_string();

        if content.is_empty() {
            return Err(IssueCostError::Provider {
                provider: "anthropic".into(),
                message: "empty completion".into(),
                retriable: false,
            });
        }

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let p = AnthropicProvider::new("key".into(), None);
        let body = p.build_request_body(
            &CompletionRequest::new("analyze this issue").with_system("be terse"),
        );
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "analyze this issue");
        assert_eq!(body["system"], "be terse");
    }

    #[test]
    fn test_model_override() {
        let p = AnthropicProvider::new("key".into(), Some("claude-haiku-3-5-20241022".into()));
        let body = p.build_request_body(&CompletionRequest::new("x"));
        assert_eq!(body["model"], "claude-haiku-3-5-20241022");
    }
}
