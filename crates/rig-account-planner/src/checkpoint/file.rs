//! File-based checkpointer
//!
//! One file per run, optionally zstd-compressed:
//!
//! ```text
//! checkpoints/
//! ├── 3f2b1c1e-8d4a-4f7e-9a52-0c8f6a1b2c3d.json[.zst]
//! └── 9a0e...json[.zst]
//! ```

use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{validate_run_id, Checkpoint, Checkpointer};
use crate::error::PlannerError;

/// Stores each run's checkpoint as a JSON file.
///
/// Writes go to a uniquely named temp file that is synced and renamed over
/// the target, so readers never observe a partial checkpoint.
#[derive(Debug, Clone)]
pub struct FileCheckpointer {
    dir: PathBuf,
    /// Whether to compress checkpoints with zstd
    compression: bool,
}

impl FileCheckpointer {
    pub fn new(dir: impl Into<PathBuf>, compression: bool) -> Self {
        Self {
            dir: dir.into(),
            compression,
        }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn extension(&self) -> &'static str {
        if self.compression {
            ".json.zst"
        } else {
            ".json"
        }
    }

    fn checkpoint_path(&self, run_id: &str) -> Result<PathBuf, PlannerError> {
        validate_run_id(run_id)?;
        Ok(self.dir.join(format!("{run_id}{}", self.extension())))
    }

    fn temp_path(&self, run_id: &str) -> PathBuf {
        self.dir
            .join(format!(".{run_id}.{}.tmp", uuid::Uuid::new_v4().simple()))
    }

    async fn ensure_dir(&self) -> Result<(), PlannerError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PlannerError::checkpoint_error(format!("Failed to create directory: {}", e)))
    }

    fn compress(data: &[u8]) -> Result<Vec<u8>, PlannerError> {
        let mut encoder = zstd::stream::Encoder::new(Vec::new(), 3)
            .map_err(|e| PlannerError::checkpoint_error(format!("Compression init failed: {}", e)))?;
        encoder
            .write_all(data)
            .map_err(|e| PlannerError::checkpoint_error(format!("Compression write failed: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| PlannerError::checkpoint_error(format!("Compression finish failed: {}", e)))
    }

    fn decompress(data: &[u8]) -> Result<Vec<u8>, PlannerError> {
        zstd::stream::decode_all(data)
            .map_err(|e| PlannerError::checkpoint_error(format!("Decompression failed: {}", e)))
    }

    /// Run id encoded in a checkpoint file name, if it is one
    fn parse_run_id(&self, filename: &str) -> Option<String> {
        let run_id = filename.strip_suffix(self.extension())?;
        validate_run_id(run_id).ok()?;
        Some(run_id.to_string())
    }
}

#[async_trait]
impl Checkpointer for FileCheckpointer {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), PlannerError> {
        let final_path = self.checkpoint_path(&checkpoint.run_id)?;
        self.ensure_dir().await?;

        let json = serde_json::to_vec_pretty(checkpoint)
            .map_err(|e| PlannerError::checkpoint_error(format!("Serialization failed: {}", e)))?;

        let data = if self.compression {
            Self::compress(&json)?
        } else {
            json
        };

        let temp_path = self.temp_path(&checkpoint.run_id);

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| PlannerError::checkpoint_error(format!("Failed to create temp file: {}", e)))?;

        file.write_all(&data)
            .await
            .map_err(|e| PlannerError::checkpoint_error(format!("Failed to write data: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| PlannerError::checkpoint_error(format!("Failed to sync file: {}", e)))?;

        fs::rename(&temp_path, &final_path)
            .await
            .map_err(|e| PlannerError::checkpoint_error(format!("Failed to rename file: {}", e)))?;

        debug!(run_id = %checkpoint.run_id, path = %final_path.display(), "Checkpoint saved");
        Ok(())
    }

    async fn load(&self, run_id: &str) -> Result<Option<Checkpoint>, PlannerError> {
        let path = self.checkpoint_path(run_id)?;

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PlannerError::checkpoint_error(format!(
                    "Failed to read file: {}",
                    e
                )))
            }
        };

        let json = if self.compression {
            Self::decompress(&data)?
        } else {
            data
        };

        let checkpoint: Checkpoint = serde_json::from_slice(&json)
            .map_err(|e| PlannerError::checkpoint_error(format!("Deserialization failed: {}", e)))?;

        if checkpoint.run_id != run_id {
            return Err(PlannerError::checkpoint_error(format!(
                "Checkpoint file for {} holds run {}",
                run_id, checkpoint.run_id
            )));
        }

        Ok(Some(checkpoint))
    }

    async fn list(&self) -> Result<Vec<String>, PlannerError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(PlannerError::checkpoint_error(format!(
                    "Failed to read directory: {}",
                    e
                )))
            }
        };

        let mut run_ids = Vec::new();

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PlannerError::checkpoint_error(format!("Failed to read entry: {}", e)))?
        {
            if let Some(run_id) = entry.file_name().to_str().and_then(|n| self.parse_run_id(n)) {
                run_ids.push(run_id);
            }
        }

        run_ids.sort();
        Ok(run_ids)
    }

    async fn delete(&self, run_id: &str) -> Result<bool, PlannerError> {
        let path = self.checkpoint_path(run_id)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PlannerError::checkpoint_error(format!(
                "Failed to delete file: {}",
                e
            ))),
        }
    }
}
