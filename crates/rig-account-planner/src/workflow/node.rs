use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow node identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    Researcher,
    Reviewer,
    HumanReview,
    Writer,
    /// Terminal marker; never executed
    End,
}

impl NodeId {
    /// Entry point of every run
    pub const ENTRY: NodeId = NodeId::Researcher;

    /// Every node in topological order
    pub const ALL: [NodeId; 5] = [
        NodeId::Researcher,
        NodeId::Reviewer,
        NodeId::HumanReview,
        NodeId::Writer,
        NodeId::End,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeId::Researcher => "researcher",
            NodeId::Reviewer => "reviewer",
            NodeId::HumanReview => "human_review",
            NodeId::Writer => "writer",
            NodeId::End => "end",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeId::End)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
