//! Run registry
//!
//! [`ResearchOrchestrator`] owns the compiled workflow and a checkpoint
//! store. Each run gets a generated id; the run's state lives in the store
//! between `start` and `resume`, so a paused run can be resumed by another
//! orchestrator sharing the same store.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::checkpoint::{validate_run_id, Checkpoint, Checkpointer};
use crate::error::PlannerError;
use crate::prompts::STOPPED_REPORT;
use crate::state::{AgentState, AgentUpdate, ResearchFinding};
use crate::workflow::routing::STOP_RESOLUTION;
use crate::workflow::{CompiledWorkflow, StageContext};

/// Human decision that unblocks a paused run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Resolution {
    /// Write the report from the data as it stands
    Proceed,
    /// End the run without a report
    Stop,
    /// Add the text as a finding, then write the report
    Clarification(String),
}

impl Resolution {
    /// Value recorded in `AgentState::human_resolution`
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Proceed => "proceed",
            Resolution::Stop => STOP_RESOLUTION,
            Resolution::Clarification(_) => "clarification",
        }
    }

    fn validate(&self) -> Result<(), PlannerError> {
        match self {
            Resolution::Clarification(text) if text.trim().is_empty() => Err(
                PlannerError::InvalidResolution("clarification text is empty".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// State update applied before the run continues. Always clears the
    /// conflict flag; the question and excerpt stay as a record.
    pub fn apply(&self) -> AgentUpdate {
        let update = AgentUpdate::new()
            .with_conflict_cleared()
            .with_human_resolution(self.as_str());
        match self {
            Resolution::Clarification(text) => {
                let mut update =
                    update.with_appended_finding(ResearchFinding::human_clarification(text.clone()));
                update.log(format!("👤 HUMAN CLARIFICATION: {text}"));
                update
            }
            Resolution::Proceed | Resolution::Stop => update,
        }
    }
}

impl FromStr for Resolution {
    type Err = PlannerError;

    /// Exactly `proceed` and `stop` are keywords; any other text is a clarification.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(PlannerError::InvalidResolution(
                "resolution must not be empty".to_string(),
            ));
        }
        Ok(match text {
            "proceed" => Resolution::Proceed,
            "stop" => Resolution::Stop,
            _ => Resolution::Clarification(text.to_string()),
        })
    }
}

/// Outcome of `start` or `resume`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunResult {
    Completed {
        run_id: String,
        final_report: String,
    },
    Paused {
        run_id: String,
        clarification_question: String,
        conflicting_data: String,
    },
    Stopped {
        run_id: String,
    },
}

impl RunResult {
    pub fn from_checkpoint(checkpoint: &Checkpoint) -> Self {
        let run_id = checkpoint.run_id.clone();
        let state = &checkpoint.state;

        if !checkpoint.is_finished() {
            RunResult::Paused {
                run_id,
                clarification_question: state.clarification_question.clone(),
                conflicting_data: state.conflicting_data.clone(),
            }
        } else if state.human_resolution == STOP_RESOLUTION && !state.has_report() {
            RunResult::Stopped { run_id }
        } else {
            RunResult::Completed {
                run_id,
                final_report: state.final_report.clone(),
            }
        }
    }

    pub fn run_id(&self) -> &str {
        match self {
            RunResult::Completed { run_id, .. }
            | RunResult::Paused { run_id, .. }
            | RunResult::Stopped { run_id } => run_id,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            RunResult::Completed { .. } => "completed",
            RunResult::Paused { .. } => "paused",
            RunResult::Stopped { .. } => "stopped",
        }
    }

    /// Report to show the user; stopped runs get a fixed notice
    pub fn report(&self) -> Option<&str> {
        match self {
            RunResult::Completed { final_report, .. } => Some(final_report.as_str()),
            RunResult::Stopped { .. } => Some(STOPPED_REPORT),
            RunResult::Paused { .. } => None,
        }
    }
}

/// Marks a run as in flight until dropped
struct RunClaim<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    run_id: String,
}

impl Drop for RunClaim<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.run_id);
    }
}

/// Starts, resumes and tracks research runs.
///
/// Shareable across tasks behind an `Arc`; calls for different runs proceed
/// concurrently, a second call for a run that is in flight fails with
/// [`PlannerError::RunBusy`].
pub struct ResearchOrchestrator {
    workflow: CompiledWorkflow,
    checkpointer: Arc<dyn Checkpointer>,
    in_flight: Mutex<HashSet<String>>,
}

impl ResearchOrchestrator {
    pub fn new(context: StageContext, checkpointer: Arc<dyn Checkpointer>) -> Self {
        Self::with_workflow(CompiledWorkflow::new(context), checkpointer)
    }

    pub fn with_workflow(workflow: CompiledWorkflow, checkpointer: Arc<dyn Checkpointer>) -> Self {
        Self {
            workflow,
            checkpointer,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn workflow(&self) -> &CompiledWorkflow {
        &self.workflow
    }

    pub fn checkpointer(&self) -> &Arc<dyn Checkpointer> {
        &self.checkpointer
    }

    /// Start a run under a fresh UUID v4 id.
    pub async fn start(&self, company: &str) -> Result<RunResult, PlannerError> {
        let run_id = Uuid::new_v4().to_string();
        self.start_with_id(&run_id, company).await
    }

    /// Start a run under a caller-chosen id. The id must not be in use.
    pub async fn start_with_id(
        &self,
        run_id: &str,
        company: &str,
    ) -> Result<RunResult, PlannerError> {
        validate_run_id(run_id)?;
        let _claim = self.claim(run_id)?;

        if self.checkpointer.load(run_id).await?.is_some() {
            return Err(PlannerError::RunExists(run_id.to_string()));
        }

        async {
            info!(company, "Starting run");
            let execution = self.workflow.invoke(AgentState::new(company)).await?;
            let next = execution.next_node();
            let checkpoint =
                Checkpoint::new(run_id, execution.state, next).with_metadata("company", company);
            self.persist(checkpoint).await
        }
        .instrument(info_span!("run", run_id = %run_id))
        .await
    }

    /// Resume a run paused at human review.
    pub async fn resume(
        &self,
        run_id: &str,
        resolution: Resolution,
    ) -> Result<RunResult, PlannerError> {
        validate_run_id(run_id)?;
        resolution.validate()?;
        let _claim = self.claim(run_id)?;

        let checkpoint = self
            .checkpointer
            .load(run_id)
            .await?
            .ok_or_else(|| PlannerError::RunNotFound(run_id.to_string()))?;

        if !checkpoint.is_suspended() {
            return Err(PlannerError::not_paused(run_id, checkpoint.next_node.as_str()));
        }

        async {
            info!(resolution = resolution.as_str(), "Resuming run");
            let state = checkpoint.state.apply_update(resolution.apply());
            let execution = self.workflow.resume_from(checkpoint.next_node, state).await?;
            let next = execution.next_node();
            let checkpoint = checkpoint
                .advance(execution.state, next)
                .with_metadata("resolution", resolution.as_str());
            self.persist(checkpoint).await
        }
        .instrument(info_span!("run", run_id = %run_id))
        .await
    }

    /// Stored checkpoint for a run
    pub async fn snapshot(&self, run_id: &str) -> Result<Option<Checkpoint>, PlannerError> {
        self.checkpointer.load(run_id).await
    }

    /// Ids of all stored runs
    pub async fn runs(&self) -> Result<Vec<String>, PlannerError> {
        self.checkpointer.list().await
    }

    /// Forget a run. Returns whether it existed.
    pub async fn discard(&self, run_id: &str) -> Result<bool, PlannerError> {
        let _claim = self.claim(run_id)?;
        let existed = self.checkpointer.delete(run_id).await?;
        if existed {
            info!(run_id = %run_id, "Run discarded");
        }
        Ok(existed)
    }

    fn claim(&self, run_id: &str) -> Result<RunClaim<'_>, PlannerError> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(run_id.to_string()) {
            return Err(PlannerError::RunBusy(run_id.to_string()));
        }
        Ok(RunClaim {
            in_flight: &self.in_flight,
            run_id: run_id.to_string(),
        })
    }

    async fn persist(&self, checkpoint: Checkpoint) -> Result<RunResult, PlannerError> {
        let result = RunResult::from_checkpoint(&checkpoint);
        let checkpoint = checkpoint.with_metadata("status", result.status());
        self.checkpointer.save(&checkpoint).await?;
        info!(status = result.status(), next_node = %checkpoint.next_node, "Checkpoint saved");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::HUMAN_CLARIFICATION_QUERY;
    use crate::workflow::NodeId;

    static_assertions::assert_impl_all!(ResearchOrchestrator: Send, Sync);

    #[test]
    fn test_resolution_from_str() {
        assert_eq!("proceed".parse::<Resolution>().unwrap(), Resolution::Proceed);
        assert_eq!(" proceed ".parse::<Resolution>().unwrap(), Resolution::Proceed);
        assert_eq!("stop".parse::<Resolution>().unwrap(), Resolution::Stop);
        assert_eq!(
            " Revenue is $2B ".parse::<Resolution>().unwrap(),
            Resolution::Clarification("Revenue is $2B".to_string())
        );
        assert!(matches!(
            "   ".parse::<Resolution>(),
            Err(PlannerError::InvalidResolution(_))
        ));
    }

    #[test]
    fn test_resolution_keywords_are_case_sensitive() {
        assert_eq!(
            "Stop".parse::<Resolution>().unwrap(),
            Resolution::Clarification("Stop".to_string())
        );
        assert_eq!(
            "STOP".parse::<Resolution>().unwrap(),
            Resolution::Clarification("STOP".to_string())
        );
        assert_eq!(
            "Proceed".parse::<Resolution>().unwrap(),
            Resolution::Clarification("Proceed".to_string())
        );
    }

    #[test]
    fn test_resolution_apply_proceed_and_stop() {
        let mut state = AgentState::new("Acme");
        state.conflicting_info = true;
        state.clarification_question = "Q".to_string();

        let proceed = state.apply_update(Resolution::Proceed.apply());
        assert!(!proceed.conflicting_info);
        assert_eq!(proceed.human_resolution, "proceed");
        assert_eq!(proceed.clarification_question, "Q");
        assert!(proceed.research_data.is_empty());

        let stop = state.apply_update(Resolution::Stop.apply());
        assert!(!stop.conflicting_info);
        assert_eq!(stop.human_resolution, "stop");
    }

    #[test]
    fn test_resolution_apply_clarification() {
        let mut state = AgentState::new("Acme");
        state.conflicting_info = true;

        let next = state.apply_update(Resolution::Clarification("Use $2B".to_string()).apply());

        assert!(!next.conflicting_info);
        assert_eq!(next.human_resolution, "clarification");
        let added = next.research_data.last().unwrap();
        assert_eq!(added.query, HUMAN_CLARIFICATION_QUERY);
        assert_eq!(added.content, "Use $2B");
        assert_eq!(added.title, "Manual Review Note");
        assert_eq!(added.url, "human-input");
        assert_eq!(
            next.messages.last().map(String::as_str),
            Some("👤 HUMAN CLARIFICATION: Use $2B")
        );
    }

    #[test]
    fn test_resolution_serde() {
        let json = serde_json::to_string(&Resolution::Clarification("x".to_string())).unwrap();
        assert_eq!(json, r#"{"kind":"clarification","text":"x"}"#);
        let parsed: Resolution = serde_json::from_str(r#"{"kind":"stop"}"#).unwrap();
        assert_eq!(parsed, Resolution::Stop);
    }

    #[test]
    fn test_run_result_from_checkpoint() {
        let mut state = AgentState::new("Acme");
        state.clarification_question = "Q".to_string();
        state.conflicting_data = "D".to_string();

        let paused = Checkpoint::new("r1", state.clone(), NodeId::HumanReview);
        assert_eq!(
            RunResult::from_checkpoint(&paused),
            RunResult::Paused {
                run_id: "r1".to_string(),
                clarification_question: "Q".to_string(),
                conflicting_data: "D".to_string(),
            }
        );

        state.human_resolution = "stop".to_string();
        let stopped = RunResult::from_checkpoint(&Checkpoint::new("r1", state.clone(), NodeId::End));
        assert_eq!(stopped, RunResult::Stopped { run_id: "r1".to_string() });
        assert_eq!(stopped.report(), Some(STOPPED_REPORT));

        state.human_resolution = "proceed".to_string();
        state.final_report = "# Account Plan: Acme".to_string();
        let completed = RunResult::from_checkpoint(&Checkpoint::new("r1", state, NodeId::End));
        assert_eq!(completed.status(), "completed");
        assert_eq!(completed.report(), Some("# Account Plan: Acme"));
    }

    #[test]
    fn test_run_result_serialization() {
        let result = RunResult::Stopped {
            run_id: "r1".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::json!({"status": "stopped", "run_id": "r1"})
        );
    }
}
