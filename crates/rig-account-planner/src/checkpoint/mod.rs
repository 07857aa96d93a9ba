//! Run checkpoints
//!
//! A checkpoint is the saved state of one run plus the node it continues
//! from. The orchestrator writes one whenever a run pauses or finishes, and
//! a paused run can be resumed from any process that shares the store.
//!
//! ```ignore
//! use rig_account_planner::checkpoint::{create_checkpointer, CheckpointerConfig};
//!
//! let store = create_checkpointer(CheckpointerConfig::File {
//!     path: PathBuf::from("./checkpoints"),
//!     compression: true,
//! })?;
//! store.save(&checkpoint).await?;
//! let restored = store.load(&checkpoint.run_id).await?;
//! ```

mod file;

pub use file::FileCheckpointer;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::PlannerError;
use crate::state::AgentState;
use crate::workflow::NodeId;

/// Longest accepted run id
pub const MAX_RUN_ID_LEN: usize = 128;

/// Check that a run id is 1-128 characters of `[A-Za-z0-9_-]`.
pub fn validate_run_id(run_id: &str) -> Result<(), PlannerError> {
    let valid = !run_id.is_empty()
        && run_id.len() <= MAX_RUN_ID_LEN
        && run_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(PlannerError::InvalidRunId(run_id.to_string()))
    }
}

/// Saved state of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub run_id: String,

    pub state: AgentState,

    /// Node to run when the run continues; `End` once finished
    pub next_node: NodeId,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Free-form annotations (e.g. `status`)
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Checkpoint {
    pub fn new(run_id: impl Into<String>, state: AgentState, next_node: NodeId) -> Self {
        let now = Utc::now();
        Self {
            run_id: run_id.into(),
            state,
            next_node,
            created_at: now,
            updated_at: now,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Successor checkpoint for the same run; keeps `created_at` and metadata.
    pub fn advance(self, state: AgentState, next_node: NodeId) -> Self {
        Self {
            state,
            next_node,
            updated_at: Utc::now(),
            ..self
        }
    }

    /// Waiting at the human review checkpoint
    pub fn is_suspended(&self) -> bool {
        self.next_node == NodeId::HumanReview
    }

    pub fn is_finished(&self) -> bool {
        self.next_node.is_terminal()
    }
}

/// Storage for run checkpoints, keyed by run id.
///
/// Implementations must tolerate concurrent calls for different runs.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Save (or overwrite) the checkpoint for `checkpoint.run_id`.
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), PlannerError>;

    /// Load a run's checkpoint; `None` if the run is unknown.
    async fn load(&self, run_id: &str) -> Result<Option<Checkpoint>, PlannerError>;

    /// All stored run ids, sorted ascending.
    async fn list(&self) -> Result<Vec<String>, PlannerError>;

    /// Delete a run's checkpoint. Returns whether one existed.
    async fn delete(&self, run_id: &str) -> Result<bool, PlannerError>;

    /// Delete every checkpoint.
    async fn clear(&self) -> Result<(), PlannerError> {
        for run_id in self.list().await? {
            self.delete(&run_id).await?;
        }
        Ok(())
    }
}

/// Configuration for creating checkpointers.
#[derive(Debug, Clone, Default)]
pub enum CheckpointerConfig {
    /// In-process store; lost on exit
    #[default]
    Memory,

    /// One JSON file per run
    File {
        /// Directory to store checkpoint files
        path: PathBuf,
        /// Whether to compress checkpoint data (uses zstd)
        compression: bool,
    },
}

/// In-memory checkpointer.
#[derive(Debug, Default)]
pub struct MemoryCheckpointer {
    checkpoints: tokio::sync::RwLock<HashMap<String, Checkpoint>>,
}

impl MemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for MemoryCheckpointer {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), PlannerError> {
        let mut checkpoints = self.checkpoints.write().await;
        checkpoints.insert(checkpoint.run_id.clone(), checkpoint.clone());
        Ok(())
    }

    async fn load(&self, run_id: &str) -> Result<Option<Checkpoint>, PlannerError> {
        let checkpoints = self.checkpoints.read().await;
        Ok(checkpoints.get(run_id).cloned())
    }

    async fn list(&self) -> Result<Vec<String>, PlannerError> {
        let checkpoints = self.checkpoints.read().await;
        let mut run_ids: Vec<String> = checkpoints.keys().cloned().collect();
        run_ids.sort();
        Ok(run_ids)
    }

    async fn delete(&self, run_id: &str) -> Result<bool, PlannerError> {
        let mut checkpoints = self.checkpoints.write().await;
        Ok(checkpoints.remove(run_id).is_some())
    }

    async fn clear(&self) -> Result<(), PlannerError> {
        self.checkpoints.write().await.clear();
        Ok(())
    }
}

/// Create a checkpointer from configuration.
pub fn create_checkpointer(
    config: CheckpointerConfig,
) -> Result<Arc<dyn Checkpointer>, PlannerError> {
    match config {
        CheckpointerConfig::Memory => Ok(Arc::new(MemoryCheckpointer::new())),
        CheckpointerConfig::File { path, compression } => {
            if path.as_os_str().is_empty() {
                return Err(PlannerError::config_error("checkpoint path must not be empty"));
            }
            Ok(Arc::new(FileCheckpointer::new(path, compression)))
        }
    }
}
