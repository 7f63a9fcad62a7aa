//! Durable reconciliation progress
//!
//! The checkpoint is one JSON object, read once at startup and written after
//! every completed set. It is the resumability boundary: a crash loses at
//! most the in-progress set's partial work. The store is injected so tests
//! run against an in-memory fake instead of real files.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Classification of a recorded (non-fatal) problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Retries exhausted on a set's search call
    FetchFailed,
    /// Label parsed via the fallback rule, no catalog number extracted.
    /// A warning: the card is still inserted with an empty number.
    ParseAmbiguous,
    /// Persistence rejected a card insert
    InsertFailed,
}

/// One recorded problem with its context
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub set_name: String,
    pub detail: String,
    pub at: String,
}

/// Process-wide durable reconciliation state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCheckpoint {
    /// Resume cursor: number of sets (in ascending-id order) fully handled
    pub set_index: usize,
    pub total_sets: usize,
    /// Cumulative cards inserted across all runs
    pub cards_added: u64,
    pub sets_processed: usize,
    #[serde(default)]
    pub errors: Vec<ErrorRecord>,
    pub last_updated: String,
}

impl ImportCheckpoint {
    pub fn record_error(&mut self, kind: ErrorKind, set_name: &str, detail: String) {
        if kind == ErrorKind::ParseAmbiguous {
            log::warn!("[{}] {}", set_name, detail);
        } else {
            log::error!("[{}] {:?}: {}", set_name, kind, detail);
        }
        self.errors.push(ErrorRecord {
            kind,
            set_name: set_name.to_string(),
            detail,
            at: now(),
        });
    }

    pub fn touch(&mut self) {
        self.last_updated = now();
    }

    /// The most recent error messages, newest last
    pub fn recent_errors(&self, limit: usize) -> impl Iterator<Item = &ErrorRecord> {
        self.errors.iter().skip(self.errors.len().saturating_sub(limit))
    }
}

/// Current local time as "YYYY-MM-DD HH:MM:SS"
fn now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Load/save access to the durable checkpoint
pub trait CheckpointStore {
    /// `None` when no checkpoint has ever been saved (fresh run)
    fn load(&self) -> Result<Option<ImportCheckpoint>>;
    fn save(&mut self, checkpoint: &ImportCheckpoint) -> Result<()>;
}

/// Checkpoint persisted as a JSON file
pub struct JsonCheckpointStore {
    path: PathBuf,
}

impl JsonCheckpointStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn load(&self) -> Result<Option<ImportCheckpoint>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        let checkpoint = serde_json::from_str(&contents)?;
        Ok(Some(checkpoint))
    }

    fn save(&mut self, checkpoint: &ImportCheckpoint) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(checkpoint)?;
        fs::write(&self.path, contents)?;
        log::debug!(
            "Checkpoint saved: set {}/{}, {} cards added",
            checkpoint.set_index,
            checkpoint.total_sets,
            checkpoint.cards_added
        );
        Ok(())
    }
}

/// In-memory checkpoint store for tests
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    saved: Option<ImportCheckpoint>,
    pub save_count: usize,
}

impl MemoryCheckpointStore {
    pub fn with_checkpoint(checkpoint: ImportCheckpoint) -> Self {
        Self {
            saved: Some(checkpoint),
            save_count: 0,
        }
    }

    pub fn latest(&self) -> Option<&ImportCheckpoint> {
        self.saved.as_ref()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self) -> Result<Option<ImportCheckpoint>> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, checkpoint: &ImportCheckpoint) -> Result<()> {
        self.saved = Some(checkpoint.clone());
        self.save_count += 1;
        Ok(())
    }
}
