//! LLM providers
//!
//! The review and write stages each make one request: a fixed system prompt
//! plus a user message built from the research findings. [`LLMProvider`]
//! captures exactly that, and the rig-backed providers implement it.
//!
//! ```rust,ignore
//! use rig_account_planner::llm::{GeminiProvider, LLMConfig, LLMProvider};
//!
//! let provider = GeminiProvider::from_env()?
//!     .with_config(LLMConfig::new("gemini-2.5-flash").with_temperature(0.7));
//! let text = provider.complete("You are terse.", "Say hello").await?;
//! ```

mod config;
mod gemini;
mod openai;
mod provider;

pub use config::LLMConfig;
pub use gemini::{GeminiProvider, DEFAULT_GEMINI_MODEL};
pub use openai::{OpenAIProvider, DEFAULT_OPENAI_MODEL};
pub use provider::LLMProvider;

/// Temperature used when none is configured
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
