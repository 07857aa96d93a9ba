//! Google Gemini provider via Rig

use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::gemini::Client;

use super::config::LLMConfig;
use super::provider::LLMProvider;
use super::DEFAULT_TEMPERATURE;
use crate::error::LlmError;

/// Default Gemini model
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Environment variables checked for a Gemini key, in order
const API_KEY_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// Gemini LLM Provider
///
/// ```rust,ignore
/// let provider = GeminiProvider::from_env()?; // GOOGLE_API_KEY or GEMINI_API_KEY
/// ```
pub struct GeminiProvider {
    client: Client,
    config: LLMConfig,
}

impl GeminiProvider {
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_env_with_model(DEFAULT_GEMINI_MODEL)
    }

    pub fn from_env_with_model(model: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = API_KEY_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                LlmError::NotConfigured("GOOGLE_API_KEY or GEMINI_API_KEY not found".to_string())
            })?;
        Ok(Self::new(api_key, model))
    }

    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let api_key = api_key.into();
        let client = Client::from_val(api_key.into());

        Self {
            client,
            config: LLMConfig::new(model_or_default(model.into()))
                .with_temperature(DEFAULT_TEMPERATURE),
        }
    }

    /// Replace the request configuration; an empty model keeps the current one
    pub fn with_config(mut self, config: LLMConfig) -> Self {
        let model = if config.model.is_empty() {
            std::mem::take(&mut self.config.model)
        } else {
            config.model.clone()
        };
        self.config = LLMConfig { model, ..config };
        self
    }
}

fn model_or_default(model: String) -> String {
    if model.trim().is_empty() {
        DEFAULT_GEMINI_MODEL.to_string()
    } else {
        model
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let mut agent_builder = self.client.agent(&self.config.model).preamble(system);

        if let Some(temp) = self.config.temperature {
            agent_builder = agent_builder.temperature(temp);
        }
        if let Some(max_tokens) = self.config.max_tokens {
            agent_builder = agent_builder.max_tokens(max_tokens);
        }

        agent_builder
            .build()
            .prompt(user)
            .await
            .map_err(|e| LlmError::Completion(format!("Gemini completion failed: {}", e)))
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }
}
