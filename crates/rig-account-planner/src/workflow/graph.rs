//! Workflow topology and Mermaid rendering
//!
//! # Node Shapes
//!
//! | Node         | Shape       | Mermaid Syntax |
//! |--------------|-------------|----------------|
//! | researcher   | Subroutine  | `id[[label]]`  |
//! | reviewer     | Rectangle   | `id[label]`    |
//! | human_review | Hexagon     | `id{{label}}`  |
//! | writer       | Rectangle   | `id[label]`    |
//! | START/END    | Stadium     | `id([label])`  |

use super::node::NodeId;
use super::routing::{route_after_human, route_after_review};
use crate::state::AgentState;

/// Nodes the executor stops in front of
pub const INTERRUPT_BEFORE: &[NodeId] = &[NodeId::HumanReview];

/// A directed edge; conditional edges carry the routing label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub condition: Option<&'static str>,
}

const fn edge(from: NodeId, to: NodeId, condition: Option<&'static str>) -> Edge {
    Edge { from, to, condition }
}

/// Every edge of the graph, grouped by source node
pub const EDGES: [Edge; 6] = [
    edge(NodeId::Researcher, NodeId::Reviewer, None),
    edge(NodeId::Reviewer, NodeId::HumanReview, Some("needs_human_review")),
    edge(NodeId::Reviewer, NodeId::Writer, Some("continue_to_writer")),
    edge(NodeId::HumanReview, NodeId::End, Some("end")),
    edge(NodeId::HumanReview, NodeId::Writer, Some("writer")),
    edge(NodeId::Writer, NodeId::End, None),
];

/// Node that follows `current` given the state produced by running it.
pub fn successor(current: NodeId, state: &AgentState) -> NodeId {
    match current {
        NodeId::Researcher => NodeId::Reviewer,
        NodeId::Reviewer => route_after_review(state),
        NodeId::HumanReview => route_after_human(state),
        NodeId::Writer | NodeId::End => NodeId::End,
    }
}

/// Outgoing edges of `node`
pub fn edges_from(node: NodeId) -> impl Iterator<Item = &'static Edge> {
    EDGES.iter().filter(move |e| e.from == node)
}

/// Mermaid identifier; `end` is reserved in flowcharts.
fn mermaid_id(node: NodeId) -> &'static str {
    match node {
        NodeId::End => "END",
        other => other.as_str(),
    }
}

fn render_node(node: NodeId) -> String {
    let id = mermaid_id(node);
    match node {
        NodeId::Researcher => format!("    {id}[[{}]]", node.as_str()),
        NodeId::HumanReview => format!("    {id}{{{{{}}}}}:::interrupt", node.as_str()),
        NodeId::End => format!("    {id}([{id}])"),
        _ => format!("    {id}[{}]", node.as_str()),
    }
}

/// Solid arrow for unconditional edges, dotted and labelled otherwise
fn render_edge(edge: &Edge) -> String {
    let from = mermaid_id(edge.from);
    let to = mermaid_id(edge.to);
    match edge.condition {
        Some(label) => format!("    {from} -. \"{label}\" .-> {to}"),
        None => format!("    {from} --> {to}"),
    }
}

const STYLE_DEFS: &str = "    classDef interrupt fill:#FFE4B5,stroke:#FF8C00,stroke-width:2px";

/// Render the workflow as a Mermaid flowchart.
pub fn render_mermaid() -> String {
    let mut lines = vec!["graph TD".to_string(), "    START([START])".to_string()];
    lines.extend(NodeId::ALL.into_iter().map(render_node));
    lines.push(String::new());
    lines.push(format!("    START --> {}", mermaid_id(NodeId::ENTRY)));
    lines.extend(EDGES.iter().map(render_edge));
    lines.push(String::new());
    lines.push(STYLE_DEFS.to_string());
    lines.join("\n") + "\n"
}
