//! Workflow state
//!
//! [`AgentState`] is the single record threaded through every stage. Stages
//! never touch it directly: each returns an [`AgentUpdate`] and the executor
//! derives the next state with [`AgentState::apply_update`].

use serde::{Deserialize, Serialize};

/// Query label for findings supplied by a human reviewer
pub const HUMAN_CLARIFICATION_QUERY: &str = "Human Clarification";

/// Title of a human clarification finding
pub const HUMAN_CLARIFICATION_TITLE: &str = "Manual Review Note";

/// Stands in for a URL on human clarification findings
pub const HUMAN_CLARIFICATION_URL: &str = "human-input";

/// One search result attached to the query that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchFinding {
    pub query: String,
    pub title: String,
    pub url: String,
    pub content: String,
    /// Relevance score (0-1)
    pub score: f64,
}

impl ResearchFinding {
    /// Finding carrying free-text input from the human reviewer.
    pub fn human_clarification(text: impl Into<String>) -> Self {
        Self {
            query: HUMAN_CLARIFICATION_QUERY.to_string(),
            title: HUMAN_CLARIFICATION_TITLE.to_string(),
            url: HUMAN_CLARIFICATION_URL.to_string(),
            content: text.into(),
            score: 1.0,
        }
    }

    pub fn is_human_clarification(&self) -> bool {
        self.query == HUMAN_CLARIFICATION_QUERY
    }
}

/// State of a single research run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentState {
    /// Human-readable execution log
    pub messages: Vec<String>,
    /// Research target; fixed at creation
    pub company_name: String,
    pub research_data: Vec<ResearchFinding>,
    pub conflicting_info: bool,
    pub clarification_question: String,
    pub conflicting_data: String,
    pub final_report: String,
    pub human_resolution: String,
}

impl AgentState {
    /// Fresh state for a run; every other field starts empty.
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            ..Default::default()
        }
    }

    /// Apply a stage update, producing the next state.
    ///
    /// Pure: `self` is left untouched. Messages are appended in order,
    /// every other field is replaced only when the update carries it.
    pub fn apply_update(&self, update: AgentUpdate) -> Self {
        let mut next = self.clone();
        next.messages.extend(update.messages);
        if let Some(findings) = update.research_data {
            next.research_data = findings;
        }
        next.research_data.extend(update.appended_findings);
        if let Some(flag) = update.conflicting_info {
            next.conflicting_info = flag;
        }
        if let Some(question) = update.clarification_question {
            next.clarification_question = question;
        }
        if let Some(data) = update.conflicting_data {
            next.conflicting_data = data;
        }
        if let Some(report) = update.final_report {
            next.final_report = report;
        }
        if let Some(resolution) = update.human_resolution {
            next.human_resolution = resolution;
        }
        next
    }

    /// Whether the writer has produced a report
    pub fn has_report(&self) -> bool {
        !self.final_report.is_empty()
    }
}

/// Partial update returned by a stage.
///
/// Carries no `company_name`: the research target is fixed at creation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentUpdate {
    pub messages: Vec<String>,
    /// Replaces `research_data` wholesale
    pub research_data: Option<Vec<ResearchFinding>>,
    /// Appended after any replacement
    pub appended_findings: Vec<ResearchFinding>,
    pub conflicting_info: Option<bool>,
    pub clarification_question: Option<String>,
    pub conflicting_data: Option<String>,
    pub final_report: Option<String>,
    pub human_resolution: Option<String>,
}

impl AgentUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a log line
    pub fn log(&mut self, message: impl Into<String>) -> &mut Self {
        self.messages.push(message.into());
        self
    }

    pub fn with_research_data(mut self, findings: Vec<ResearchFinding>) -> Self {
        self.research_data = Some(findings);
        self
    }

    pub fn with_appended_finding(mut self, finding: ResearchFinding) -> Self {
        self.appended_findings.push(finding);
        self
    }

    /// Record a review verdict; a clear verdict also clears the conflict details.
    pub fn with_conflict(
        mut self,
        detected: bool,
        question: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        self.conflicting_info = Some(detected);
        if detected {
            self.clarification_question = Some(question.into());
            self.conflicting_data = Some(data.into());
        } else {
            self.clarification_question = Some(String::new());
            self.conflicting_data = Some(String::new());
        }
        self
    }

    /// Lower the conflict flag without touching the recorded question.
    pub fn with_conflict_cleared(mut self) -> Self {
        self.conflicting_info = Some(false);
        self
    }

    pub fn with_final_report(mut self, report: impl Into<String>) -> Self {
        self.final_report = Some(report.into());
        self
    }

    pub fn with_human_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.human_resolution = Some(resolution.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
