//! Error types
//!
//! Stage-level problems (missing credentials, provider failures, malformed
//! model output) never show up here: stages fold them into the run log.
//! These errors are for the run registry and the infrastructure under it.

use thiserror::Error;

/// Errors surfaced to callers of the orchestrator and checkpoint stores
#[derive(Debug, Error)]
pub enum PlannerError {
    /// No checkpoint exists for the run id
    #[error("Run not found: {0}")]
    RunNotFound(String),

    /// The run exists but is not waiting at the human checkpoint
    #[error("Run {run_id} is not awaiting human review (next node: {next_node})")]
    NotPaused { run_id: String, next_node: String },

    /// A run with this id is already stored
    #[error("Run already exists: {0}")]
    RunExists(String),

    /// Another call for the same run is in flight
    #[error("Run {0} is busy")]
    RunBusy(String),

    /// Run ids must be safe to use as file names
    #[error("Invalid run id '{0}': use 1-128 characters from [A-Za-z0-9_-]")]
    InvalidRunId(String),

    /// The resolution supplied at resume time was rejected
    #[error("Invalid resolution: {0}")]
    InvalidResolution(String),

    /// Checkpoint persistence failed
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Routing did not reach a terminal or suspended node in time
    #[error("Max steps exceeded: {0}")]
    MaxStepsExceeded(usize),

    /// Invalid planner configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PlannerError {
    /// Create a checkpoint error
    pub fn checkpoint_error(message: impl Into<String>) -> Self {
        Self::Checkpoint(message.into())
    }

    /// Create a config error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a not-paused error
    pub fn not_paused(run_id: impl Into<String>, next_node: impl Into<String>) -> Self {
        Self::NotPaused {
            run_id: run_id.into(),
            next_node: next_node.into(),
        }
    }

    /// Whether the caller can fix this by changing its request
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            PlannerError::RunNotFound(_)
                | PlannerError::RunExists(_)
                | PlannerError::NotPaused { .. }
                | PlannerError::RunBusy(_)
                | PlannerError::InvalidRunId(_)
                | PlannerError::InvalidResolution(_)
        )
    }
}

/// LLM provider errors
#[derive(Debug, Error)]
pub enum LlmError {
    /// Credentials or client setup missing
    #[error("LLM provider not configured: {0}")]
    NotConfigured(String),

    /// The completion request failed
    #[error("LLM completion failed: {0}")]
    Completion(String),
}

#[cfg(test)]
mod tests {
    static_assertions::assert_impl_all!(super::PlannerError: Send, Sync);
    static_assertions::assert_impl_all!(super::LlmError: Send, Sync);
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlannerError::MaxStepsExceeded(8);
        assert_eq!(err.to_string(), "Max steps exceeded: 8");

        let err = PlannerError::not_paused("run-1", "end");
        assert!(err.to_string().contains("run-1"));
        assert!(err.to_string().contains("end"));
    }

    #[test]
    fn test_is_caller_error() {
        assert!(PlannerError::RunNotFound("x".into()).is_caller_error());
        assert!(PlannerError::RunBusy("x".into()).is_caller_error());
        assert!(PlannerError::InvalidResolution("empty".into()).is_caller_error());
        assert!(PlannerError::InvalidRunId("../etc".into()).is_caller_error());

        assert!(!PlannerError::checkpoint_error("disk full").is_caller_error());
        assert!(!PlannerError::MaxStepsExceeded(8).is_caller_error());
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::NotConfigured("GOOGLE_API_KEY not found".into());
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }
}
