//! OpenAI LLM Provider implementation via Rig

use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::openai::Client;

use super::config::LLMConfig;
use super::provider::LLMProvider;
use super::DEFAULT_TEMPERATURE;
use crate::error::LlmError;

/// Default OpenAI chat model
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1";

/// OpenAI LLM Provider
///
/// # Example
///
/// ```rust,ignore
/// use rig_account_planner::llm::OpenAIProvider;
///
/// // Create from environment (OPENAI_API_KEY)
/// let provider = OpenAIProvider::from_env()?;
///
/// // Or with explicit configuration
/// let provider = OpenAIProvider::new("sk-...", "gpt-4.1");
/// ```
pub struct OpenAIProvider {
    client: Client,
    config: LLMConfig,
}

impl OpenAIProvider {
    /// Create from OPENAI_API_KEY with the default model
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_env_with_model(DEFAULT_OPENAI_MODEL)
    }

    pub fn from_env_with_model(model: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LlmError::NotConfigured("OPENAI_API_KEY not found".to_string()))?;
        Ok(Self::new(api_key, model))
    }

    /// Create with explicit API key and model
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
        DEFAULT_OPENAI_MODEL.to_string()
    } else {
        model
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let mut agent_builder = self.client.agent(&self.config.model).preamble(system);

        if let Some(temp) = self.config.temperature {
            agent_builder = agent_builder.temperature(temp);
        }
        if let Some(max_tokens) = self.config.max_tokens {
            agent_builder = agent_builder.max_tokens(max_tokens);
        }

        let agent = agent_builder.build();

        agent
            .prompt(user)
            .await
            .map_err(|e| LlmError::Completion(format!("OpenAI completion failed: {}", e)))
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }
}
