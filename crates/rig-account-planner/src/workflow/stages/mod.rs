//! Node bodies
//!
//! Every stage reads the current [`AgentState`] and returns an
//! [`AgentUpdate`]. Provider failures become log lines and default values,
//! so a stage always produces an update.

mod human;
mod research;
mod review;
mod writer;

pub use human::human_review;
pub use research::research;
pub use review::{review, UNPARSABLE_VERDICT_QUESTION};
pub use writer::write_report;

use std::sync::Arc;

use super::node::NodeId;
use crate::config::PlannerConfig;
use crate::llm::LLMProvider;
use crate::search::SearchProvider;
use crate::state::{AgentState, AgentUpdate};

/// Collaborators and limits shared by the stages.
///
/// A missing collaborator is not an error here: the research stage logs the
/// absent search credential and the review/write stages log the absent model.
#[derive(Clone)]
pub struct StageContext {
    config: PlannerConfig,
    search: Option<Arc<dyn SearchProvider>>,
    llm: Option<Arc<dyn LLMProvider>>,
}

impl StageContext {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            search: None,
            llm: None,
        }
    }

    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_llm(mut self, llm: Arc<dyn LLMProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn search(&self) -> Option<&Arc<dyn SearchProvider>> {
        self.search.as_ref()
    }

    pub fn llm(&self) -> Option<&Arc<dyn LLMProvider>> {
        self.llm.as_ref()
    }

    /// Run the body of `node`. `End` has no body and yields an empty update.
    pub async fn run_stage(&self, node: NodeId, state: &AgentState) -> AgentUpdate {
        match node {
            NodeId::Researcher => research(self, state).await,
            NodeId::Reviewer => review(self, state).await,
            NodeId::HumanReview => human_review(state),
            NodeId::Writer => write_report(self, state).await,
            NodeId::End => AgentUpdate::new(),
        }
    }
}

impl std::fmt::Debug for StageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageContext")
            .field("config", &self.config)
            .field("search", &self.search.as_ref().map(|s| s.name().to_string()))
            .field("llm", &self.llm.as_ref().map(|l| l.name().to_string()))
            .finish()
    }
}
