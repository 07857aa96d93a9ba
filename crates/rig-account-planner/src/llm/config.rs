//! LLM configuration types

use serde::{Deserialize, Serialize};

/// LLM Provider configuration
///
/// # Example
///
/// ```
/// use rig_account_planner::llm::LLMConfig;
///
/// let config = LLMConfig::new("gemini-2.5-flash")
///     .with_temperature(0.7)
///     .with_max_tokens(4096);
///
/// assert_eq!(config.model, "gemini-2.5-flash");
/// assert_eq!(config.temperature, Some(0.7));
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct LLMConfig {
    /// Model identifier (e.g., "gemini-2.5-flash", "gpt-4.1")
    pub model: String,
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: Option<f64>,
    /// Maximum tokens to generate in the response
    pub max_tokens: Option<u64>,
}

impl LLMConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u64) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}
