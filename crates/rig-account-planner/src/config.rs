//! Planner configuration
//!
//! Limits and policies for the workflow stages. Defaults reproduce the
//! reference behavior: 3 advanced-depth results per query, 10 findings sent
//! to the reviewer, 15 to the writer, a 500-character conflict excerpt and
//! fail-open parsing of the reviewer's verdict.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::PlannerError;
use crate::search::SearchDepth;

/// What the review stage does when the model's verdict is not valid JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseFailurePolicy {
    /// Treat unparsable output as "no conflict"
    #[default]
    FailOpen,
    /// Treat unparsable output as a conflict that needs human review
    FailClosed,
}

impl std::str::FromStr for ParseFailurePolicy {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_open" | "open" => Ok(Self::FailOpen),
            "fail_closed" | "closed" => Ok(Self::FailClosed),
            other => Err(PlannerError::config_error(format!(
                "unknown review parse policy '{}', expected fail_open or fail_closed",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Results requested per research query
    pub max_results_per_query: u32,

    pub search_depth: SearchDepth,

    /// Issue the research queries concurrently
    pub parallel_search: bool,

    /// Findings included in the reviewer prompt
    pub review_findings_limit: usize,

    /// Findings included in the writer prompt
    pub writer_findings_limit: usize,

    /// Characters of evidence kept in `conflicting_data`
    pub conflict_excerpt_chars: usize,

    /// Characters of raw model output logged when the verdict fails to parse
    pub raw_snippet_chars: usize,

    pub parse_failure_policy: ParseFailurePolicy,

    /// Upper bound on node executions per invoke/resume
    pub max_steps: usize,

    /// Optional per-query search timeout
    #[serde(with = "humantime_serde")]
    pub search_timeout: Option<Duration>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_results_per_query: 3,
            search_depth: SearchDepth::Advanced,
            parallel_search: false,
            review_findings_limit: 10,
            writer_findings_limit: 15,
            conflict_excerpt_chars: 500,
            raw_snippet_chars: 200,
            parse_failure_policy: ParseFailurePolicy::FailOpen,
            max_steps: 8,
            search_timeout: None,
        }
    }
}

impl PlannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_results_per_query(mut self, max: u32) -> Self {
        self.max_results_per_query = max;
        self
    }

    pub fn with_search_depth(mut self, depth: SearchDepth) -> Self {
        self.search_depth = depth;
        self
    }

    pub fn with_parallel_search(mut self, parallel: bool) -> Self {
        self.parallel_search = parallel;
        self
    }

    pub fn with_parse_failure_policy(mut self, policy: ParseFailurePolicy) -> Self {
        self.parse_failure_policy = policy;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = Some(timeout);
        self
    }

    /// Reject configurations the stages cannot run with.
    pub fn validate(&self) -> Result<(), PlannerError> {
        if !(1..=20).contains(&self.max_results_per_query) {
            return Err(PlannerError::config_error(format!(
                "max_results_per_query must be between 1 and 20, got {}",
                self.max_results_per_query
            )));
        }
        if self.review_findings_limit == 0 || self.writer_findings_limit == 0 {
            return Err(PlannerError::config_error(
                "findings limits must be at least 1",
            ));
        }
        // research, review, human review, write
        if self.max_steps < 4 {
            return Err(PlannerError::config_error(format!(
                "max_steps must be at least 4, got {}",
                self.max_steps
            )));
        }
        Ok(())
    }
}
