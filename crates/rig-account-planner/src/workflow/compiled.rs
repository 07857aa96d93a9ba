//! Workflow executor with interrupt-before support

use tracing::{debug, info, Instrument};

use super::graph::{successor, INTERRUPT_BEFORE};
use super::node::NodeId;
use super::stages::StageContext;
use crate::error::PlannerError;
use crate::state::AgentState;

/// How an execution stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Reached `End`
    Completed,
    /// Stopped in front of an interrupt node; resume there
    Interrupted { next: NodeId },
}

/// Result of driving the workflow until it completes or suspends
#[derive(Debug, Clone)]
pub struct Execution {
    pub state: AgentState,
    pub outcome: ExecutionOutcome,
    /// Node bodies executed during this call
    pub steps: usize,
}

impl Execution {
    pub fn is_interrupted(&self) -> bool {
        matches!(self.outcome, ExecutionOutcome::Interrupted { .. })
    }

    /// Node a later resume starts from (`End` once completed)
    pub fn next_node(&self) -> NodeId {
        match self.outcome {
            ExecutionOutcome::Completed => NodeId::End,
            ExecutionOutcome::Interrupted { next } => next,
        }
    }
}

/// The research workflow bound to its collaborators.
///
/// # Example
///
/// ```ignore
/// let workflow = CompiledWorkflow::new(context);
/// let execution = workflow.invoke(AgentState::new("Acme")).await?;
/// if let ExecutionOutcome::Interrupted { next } = execution.outcome {
///     let state = execution.state; // apply a resolution here
///     workflow.resume_from(next, state).await?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CompiledWorkflow {
    context: StageContext,
    interrupt_before: Vec<NodeId>,
    max_steps: usize,
}

impl CompiledWorkflow {
    pub fn new(context: StageContext) -> Self {
        let max_steps = context.config().max_steps;
        Self {
            context,
            interrupt_before: INTERRUPT_BEFORE.to_vec(),
            max_steps,
        }
    }

    /// Replace the set of nodes the executor stops in front of
    pub fn with_interrupt_before(mut self, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        self.interrupt_before = nodes.into_iter().collect();
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn context(&self) -> &StageContext {
        &self.context
    }

    pub fn interrupt_before(&self) -> &[NodeId] {
        &self.interrupt_before
    }

    /// Run a fresh state from the entry node.
    pub async fn invoke(&self, state: AgentState) -> Result<Execution, PlannerError> {
        self.run(NodeId::ENTRY, state, false).await
    }

    /// Continue from a suspension point. The interrupt on `node` itself is
    /// not re-triggered.
    pub async fn resume_from(
        &self,
        node: NodeId,
        state: AgentState,
    ) -> Result<Execution, PlannerError> {
        self.run(node, state, true).await
    }

    async fn run(
        &self,
        start: NodeId,
        mut state: AgentState,
        resuming: bool,
    ) -> Result<Execution, PlannerError> {
        let mut current = start;
        let mut steps = 0;
        let mut skip_interrupt = resuming;

        loop {
            if current.is_terminal() {
                info!(steps, "Workflow completed");
                return Ok(Execution {
                    state,
                    outcome: ExecutionOutcome::Completed,
                    steps,
                });
            }

            if !skip_interrupt && self.interrupt_before.contains(&current) {
                info!(node = %current, steps, "Workflow interrupted");
                return Ok(Execution {
                    state,
                    outcome: ExecutionOutcome::Interrupted { next: current },
                    steps,
                });
            }
            skip_interrupt = false;

            if steps >= self.max_steps {
                return Err(PlannerError::MaxStepsExceeded(steps));
            }

            let span = tracing::info_span!("workflow_node", node = current.as_str(), step = steps);
            let update = self.context.run_stage(current, &state).instrument(span).await;
            debug!(node = %current, lines = update.messages.len(), "Node finished");

            state = state.apply_update(update);
            steps += 1;
            current = successor(current, &state);
        }
    }
}
