//! rig-account-planner: company research workflow for account plans
//!
//! A four-stage state machine built around two external collaborators,
//! a web search provider and an LLM:
//!
//! - **Researcher**: four fixed Tavily queries about the company
//! - **Reviewer**: LLM audit of the findings for factual conflicts
//! - **Human review**: suspension point when a conflict is found
//! - **Writer**: LLM synthesis of a Markdown account plan
//!
//! Runs are driven by [`ResearchOrchestrator`], which checkpoints the state
//! whenever the workflow pauses or finishes and resumes paused runs once a
//! human [`Resolution`] arrives.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rig_account_planner::{
//!     GeminiProvider, MemoryCheckpointer, PlannerConfig, Resolution,
//!     ResearchOrchestrator, RunResult, StageContext, TavilySearchClient,
//! };
//!
//! let context = StageContext::new(PlannerConfig::default())
//!     .with_search(Arc::new(TavilySearchClient::from_env()?))
//!     .with_llm(Arc::new(GeminiProvider::from_env()?));
//! let orchestrator = ResearchOrchestrator::new(context, Arc::new(MemoryCheckpointer::new()));
//!
//! if let RunResult::Paused { run_id, .. } = orchestrator.start("Acme").await? {
//!     orchestrator.resume(&run_id, Resolution::Proceed).await?;
//! }
//! ```

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod parsing;
pub mod prompts;
pub mod search;
pub mod state;
pub mod workflow;

pub use checkpoint::{
    create_checkpointer, Checkpoint, Checkpointer, CheckpointerConfig, FileCheckpointer,
    MemoryCheckpointer,
};
pub use config::{ParseFailurePolicy, PlannerConfig};
pub use error::{LlmError, PlannerError};
pub use llm::{GeminiProvider, LLMConfig, LLMProvider, OpenAIProvider};
pub use orchestrator::{Resolution, ResearchOrchestrator, RunResult};
pub use search::{SearchDepth, SearchError, SearchHit, SearchProvider, SearchRequest};
pub use search::tavily::TavilySearchClient;
pub use state::{AgentState, AgentUpdate, ResearchFinding};
pub use workflow::{
    render_mermaid, route_after_human, route_after_review, CompiledWorkflow, Execution,
    ExecutionOutcome, NodeId, StageContext,
};
