//! JSON-over-HTTP completion backend.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

use super::{LlmConfig, TextGenerator};

const PROVIDER: &str = "http";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    text: String,
}

/// Posts `{model, prompt, max_tokens, temperature}` and reads `{text}`.
pub struct HttpTextGenerator {
    config: LlmConfig,
    client: reqwest::Client,
}

impl HttpTextGenerator {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if config.endpoint.trim().is_empty() {
            return Err(LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: "endpoint is empty".to_string(),
            });
        }
        Ok(Self {
            config,
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let body = CompletionRequest {
            model: &self.config.model,
            prompt,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };
        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("{status}: {detail}"),
            });
        }

        let parsed: CompletionResponse =
            resp.json().await.map_err(|e| LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;
        Ok(parsed.text)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
