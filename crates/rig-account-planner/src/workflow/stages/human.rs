//! Human review checkpoint.
//!
//! The executor stops before this node; by the time it runs the orchestrator
//! has already applied the reviewer's resolution, so it only records it.

use tracing::info;

use crate::state::{AgentState, AgentUpdate};

pub fn human_review(state: &AgentState) -> AgentUpdate {
    let resolution = if state.human_resolution.is_empty() {
        "none"
    } else {
        state.human_resolution.as_str()
    };
    info!(resolution, "Human review resolved");

    let mut update = AgentUpdate::new();
    update.log(format!("\nHUMAN REVIEW: resolution '{resolution}' received"));
    update
}
