//! Node snapshot storage
//!
//! Storage is an explicitly constructed collaborator handed to whatever owns
//! the scene graph. Stores only ever see owned [`NodeRecord`] snapshots.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::record::NodeRecord;

/// Errors raised by a [`NodeStore`]
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

/// Persists and restores node snapshots.
pub trait NodeStore {
    /// Replace the stored snapshot with `records`.
    fn save(&mut self, records: &[NodeRecord]) -> Result<(), StoreError>;

    /// Load the stored snapshot. An empty store yields an empty list.
    fn load(&self) -> Result<Vec<NodeRecord>, StoreError>;
}

/// In-memory store, mostly for tests and previews.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<NodeRecord>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<NodeRecord>) -> Self {
        Self { records, saves: 0 }
    }

    pub fn records(&self) -> &[NodeRecord] {
        &self.records
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl NodeStore for MemoryStore {
    fn save(&mut self, records: &[NodeRecord]) -> Result<(), StoreError> {
        self.records = records.to_vec();
        self.saves += 1;
        Ok(())
    }

    fn load(&self) -> Result<Vec<NodeRecord>, StoreError> {
        Ok(self.records.clone())
    }
}

/// Stores the snapshot as a JSON array in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NodeStore for JsonFileStore {
    fn save(&mut self, records: &[NodeRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(records)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| StoreError::Io(e.to_string()))?;

        tracing::info!("Saved {} nodes to {:?}", records.len(), self.path);
        Ok(())
    }

    fn load(&self) -> Result<Vec<NodeRecord>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No node snapshot at {:?}, starting empty", self.path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };

        let records: Vec<NodeRecord> =
            serde_json::from_str(&content).map_err(|e| StoreError::Deserialize(e.to_string()))?;
        tracing::info!("Loaded {} nodes from {:?}", records.len(), self.path);
        Ok(records)
    }
}
