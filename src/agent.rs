//! # Agent Module
//!
//! Wires the configured collaborators (Tavily search, the selected LLM
//! provider and a checkpoint store) into a [`ResearchOrchestrator`].
//!
//! Missing API keys are not fatal here: the affected stage logs the problem
//! into the run and falls back, so the CLI still shows a complete run.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use rig_account_planner::{
    create_checkpointer,
    llm::{DEFAULT_GEMINI_MODEL, DEFAULT_OPENAI_MODEL},
    GeminiProvider, LLMConfig, LLMProvider, OpenAIProvider,
    ResearchOrchestrator, SearchProvider, StageContext, TavilySearchClient,
};

use crate::config::{Config, Provider};

/// Base delay between Tavily retries
const SEARCH_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Build the orchestrator described by `config`.
pub fn build_orchestrator(config: &Config) -> Result<ResearchOrchestrator> {
    let mut context = StageContext::new(config.planner.clone());

    if let Some(search) = build_search(config) {
        context = context.with_search(search);
    }
    if let Some(llm) = build_llm(config) {
        context = context.with_llm(llm);
    }

    let checkpointer = create_checkpointer(config.checkpointer_config())
        .context("Failed to create checkpoint store")?;

    Ok(ResearchOrchestrator::new(context, checkpointer))
}

fn build_search(config: &Config) -> Option<Arc<dyn SearchProvider>> {
    let Some(api_key) = config.tavily_api_key.as_deref() else {
        warn!("TAVILY_API_KEY not set; research will record an error and continue");
        return None;
    };

    let client = TavilySearchClient::new(api_key)
        .with_max_retries(config.search_max_retries)
        .with_retry_base_delay(SEARCH_RETRY_DELAY);

    info!(provider = "tavily", retries = config.search_max_retries, "Search configured");
    Some(Arc::new(client))
}

fn build_llm(config: &Config) -> Option<Arc<dyn LLMProvider>> {
    let Some(api_key) = config.llm_api_key() else {
        warn!(provider = %config.provider, "No API key for LLM provider; review and writing will fall back");
        return None;
    };

    let model = resolve_model(config);
    let llm_config = LLMConfig::new(model).with_temperature(config.temperature);

    let provider: Arc<dyn LLMProvider> = match config.provider {
        Provider::Gemini => Arc::new(GeminiProvider::new(api_key, model).with_config(llm_config)),
        Provider::OpenAI => Arc::new(OpenAIProvider::new(api_key, model).with_config(llm_config)),
    };

    info!(provider = %config.provider, model = %model, "LLM configured");
    Some(provider)
}

/// Configured model, or the provider default when none is set
fn resolve_model(config: &Config) -> &str {
    if !config.model.is_empty() {
        return &config.model;
    }
    match config.provider {
        Provider::Gemini => DEFAULT_GEMINI_MODEL,
        Provider::OpenAI => DEFAULT_OPENAI_MODEL,
    }
}
