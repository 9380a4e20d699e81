//! Optional text-generation backend.
//!
//! The coach works fully from templates; when a backend is configured the
//! session service asks it to rephrase templated replies and falls back to the
//! template text on any failure.

pub mod http;
pub mod prompts;

pub use http::HttpTextGenerator;
pub use prompts::{accept_rephrase, rephrase_prompt};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LlmError;

/// A backend that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Name used in logs.
    fn model_name(&self) -> &str;
}

/// Configuration for the HTTP text generator.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: Option<secrecy::SecretString>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl LlmConfig {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            model: model.into(),
            max_tokens: 256,
            temperature: 0.4,
        }
    }
}

/// Create a text generator from configuration.
pub fn create_generator(config: &LlmConfig) -> Result<Arc<dyn TextGenerator>, LlmError> {
    let generator = HttpTextGenerator::new(config.clone())?;
    tracing::info!(model = %config.model, endpoint = %config.endpoint, "Using HTTP text generator");
    Ok(Arc::new(generator))
}
