//! Conditional routing decisions

use super::node::NodeId;
use crate::state::AgentState;

/// Value of `human_resolution` that ends a run without a report
pub const STOP_RESOLUTION: &str = "stop";

/// After review: a detected conflict goes to human review, otherwise to the writer.
pub fn route_after_review(state: &AgentState) -> NodeId {
    if state.conflicting_info {
        NodeId::HumanReview
    } else {
        NodeId::Writer
    }
}

/// After human review: `"stop"` ends the run, anything else writes the report.
pub fn route_after_human(state: &AgentState) -> NodeId {
    if state.human_resolution == STOP_RESOLUTION {
        NodeId::End
    } else {
        NodeId::Writer
    }
}
