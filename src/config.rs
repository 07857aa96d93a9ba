//! # Configuration Module
//!
//! Loads the binary's settings from the environment (and a `.env` file when
//! present). CLI flags are applied on top in `main.rs`.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rig_account_planner::{CheckpointerConfig, ParseFailurePolicy, PlannerConfig};

// =============================================================================
// PROVIDER SELECTION
// =============================================================================
/// Which language model backend drives the review and write stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    Gemini,
    OpenAI,
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::OpenAI),
            other => anyhow::bail!("Unknown LLM provider '{}', expected gemini or openai", other),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Gemini => write!(f, "gemini"),
            Provider::OpenAI => write!(f, "openai"),
        }
    }
}

// =============================================================================
// CONFIGURATION STRUCT
// =============================================================================
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: Provider,

    /// Model name; empty means the provider's default
    pub model: String,

    /// Temperature for LLM responses (0.0 = deterministic, 2.0 = creative)
    pub temperature: f64,

    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub tavily_api_key: Option<String>,

    /// Directory for file checkpoints; in-memory when unset
    pub checkpoint_dir: Option<PathBuf>,

    /// zstd-compress file checkpoints
    pub checkpoint_compression: bool,

    /// Retries on transient Tavily failures
    pub search_max_retries: u32,

    pub planner: PlannerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::Gemini,
            model: String::new(),
            temperature: 0.7,
            gemini_api_key: None,
            openai_api_key: None,
            tavily_api_key: None,
            checkpoint_dir: None,
            checkpoint_compression: false,
            search_max_retries: 0,
            planner: PlannerConfig::default(),
        }
    }
}

// =============================================================================
// CONFIGURATION LOADING
// =============================================================================
impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Example
    /// ```ignore
    /// let config = Config::from_env()?;
    /// println!("Using provider: {}", config.provider);
    /// ```
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (silently ignore if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|val| !val.trim().is_empty());
        let mut config = Config::default();

        if let Some(val) = get("LLM_PROVIDER") {
            config.provider = val.parse()?;
        }

        if let Some(val) = get("LLM_MODEL") {
            config.model = val.trim().to_string();
        }

        if let Some(val) = get("TEMPERATURE") {
            config.temperature = val
                .trim()
                .parse()
                .context("TEMPERATURE must be a valid floating-point number (e.g., 0.7)")?;
        }

        config.gemini_api_key = get("GOOGLE_API_KEY").or_else(|| get("GEMINI_API_KEY"));
        config.openai_api_key = get("OPENAI_API_KEY");
        config.tavily_api_key = get("TAVILY_API_KEY");
        config.checkpoint_dir = get("CHECKPOINT_DIR").map(PathBuf::from);

        if let Some(val) = get("CHECKPOINT_COMPRESSION") {
            config.checkpoint_compression =
                parse_bool(&val).context("CHECKPOINT_COMPRESSION must be true or false")?;
        }

        if let Some(val) = get("REVIEW_PARSE_POLICY") {
            config.planner.parse_failure_policy = ParseFailurePolicy::from_str(&val)?;
        }

        if let Some(val) = get("PARALLEL_SEARCH") {
            config.planner.parallel_search =
                parse_bool(&val).context("PARALLEL_SEARCH must be true or false")?;
        }

        if let Some(val) = get("SEARCH_TIMEOUT_SECS") {
            let secs: u64 = val
                .trim()
                .parse()
                .context("SEARCH_TIMEOUT_SECS must be a positive integer")?;
            config.planner.search_timeout = Some(Duration::from_secs(secs));
        }

        if let Some(val) = get("SEARCH_MAX_RETRIES") {
            config.search_max_retries = val
                .trim()
                .parse()
                .context("SEARCH_MAX_RETRIES must be a non-negative integer")?;
        }

        Ok(config)
    }

    /// Validate the configuration before any run starts.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            anyhow::bail!(
                "Temperature must be between 0.0 and 2.0, got: {}",
                self.temperature
            );
        }

        if self.planner.search_timeout == Some(Duration::ZERO) {
            anyhow::bail!("SEARCH_TIMEOUT_SECS must be at least 1");
        }

        if self.search_max_retries > 10 {
            anyhow::bail!(
                "SEARCH_MAX_RETRIES must be at most 10, got: {}",
                self.search_max_retries
            );
        }

        self.planner.validate()?;
        Ok(())
    }

    /// API key for the selected provider, if any
    pub fn llm_api_key(&self) -> Option<&str> {
        match self.provider {
            Provider::Gemini => self.gemini_api_key.as_deref(),
            Provider::OpenAI => self.openai_api_key.as_deref(),
        }
    }

    pub fn checkpointer_config(&self) -> CheckpointerConfig {
        match &self.checkpoint_dir {
            Some(path) => CheckpointerConfig::File {
                path: path.clone(),
                compression: self.checkpoint_compression,
            },
            None => CheckpointerConfig::Memory,
        }
    }
}

fn parse_bool(val: &str) -> Result<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("not a boolean: '{}'", other),
    }
}
