//! LLM Provider trait definition

use async_trait::async_trait;

use crate::error::LlmError;

/// Provider-agnostic single-turn completion
///
/// # Example Implementation
///
/// ```rust,ignore
/// struct Canned;
///
/// #[async_trait]
/// impl LLMProvider for Canned {
///     async fn complete(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
///         Ok(r#"{"conflict_detected": false, "clarification_question": ""}"#.to_string())
///     }
///     fn name(&self) -> &str { "canned" }
///     fn default_model(&self) -> &str { "canned-v1" }
/// }
/// ```
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send one system prompt and one user message, return the reply text
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;

    /// Provider name for logging/debugging
    fn name(&self) -> &str;

    /// Model identifier used for requests
    fn default_model(&self) -> &str;
}
