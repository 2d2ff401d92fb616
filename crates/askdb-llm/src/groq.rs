//! Groq chat-completions client.
use askdb_core::config::PROVIDER;
use askdb_core::{ChatModel, LlmConfig, ModelError, OutputShape, PipelineError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::wire;

pub struct GroqChatModel {
    api_key: String,
    model: String,
    endpoint: String,
    client: Client,
}

impl GroqChatModel {
    /// Build the client. A missing API key is a configuration error.
    pub fn new(config: &LlmConfig) -> Result<Self, PipelineError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            PipelineError::Config("GROQ_API_KEY (or API_KEY) environment variable not set".into())
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build HTTP client: {e}")))?;

        tracing::info!(provider = PROVIDER, model = %config.model, "model client ready");

        Ok(Self {
            api_key,
            model: config.model.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn complete(&self, body: &Value) -> Result<String, ModelError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ModelError::new(format!("Groq API error: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ModelError::new(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(ModelError::new(format!("Groq API error {status}: {text}")));
        }
        Ok(text)
    }
}

#[async_trait]
impl ChatModel for GroqChatModel {
    async fn generate_structured(
        &self,
        prompt: &str,
        shape: &OutputShape,
    ) -> Result<Value, ModelError> {
        let body = wire::structured_request(&self.model, prompt, shape);
        let text = self.complete(&body).await?;
        wire::parse_structured(&text, shape)
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, ModelError> {
        let body = wire::text_request(&self.model, prompt);
        let text = self.complete(&body).await?;
        wire::parse_text(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            api_key: api_key.map(str::to_string),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = GroqChatModel::new(&config(None)).err().unwrap();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_endpoint_and_model_defaults() {
        let model = GroqChatModel::new(&config(Some("k"))).unwrap();
        assert_eq!(model.endpoint(), "https://api.groq.com/openai/v1/chat/completions");
        assert_eq!(model.model(), "deepseek-r1-distill-llama-70b");
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_model_error() {
        let model = GroqChatModel::new(&LlmConfig {
            base_url: "http://127.0.0.1:1/v1/".to_string(),
            timeout_secs: 2,
            ..config(Some("k"))
        })
        .unwrap();
        assert_eq!(model.endpoint(), "http://127.0.0.1:1/v1/chat/completions");

        let err = model.generate_text("hello").await.unwrap_err();
        assert!(err.0.starts_with("Groq API error"));
    }
}
