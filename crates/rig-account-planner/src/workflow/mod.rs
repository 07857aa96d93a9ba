//! Research workflow state machine
//!
//! ```text
//! researcher --> reviewer --(conflict)--> human_review --(stop)--> END
//!                   |                         |
//!                   +----(clear)----> writer <+
//!                                       |
//!                                       v
//!                                      END
//! ```
//!
//! The graph is fixed: [`graph`] describes its edges, [`routing`] holds the
//! two conditional decisions, [`stages`] implements the node bodies and
//! [`CompiledWorkflow`] drives them, stopping before `human_review`.

mod compiled;
pub mod graph;
mod node;
pub mod routing;
pub mod stages;

pub use compiled::{CompiledWorkflow, Execution, ExecutionOutcome};
pub use graph::render_mermaid;
pub use node::NodeId;
pub use routing::{route_after_human, route_after_review};
pub use stages::StageContext;
