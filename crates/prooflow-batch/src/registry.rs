//! In-memory store of batch progress records.
//!
//! The registry is the single source of truth for batch state. All access
//! goes through its methods; the underlying map is never exposed, so reads
//! from the controller can hand out defensive copies only.

use chrono::{DateTime, Utc};
use prooflow_core::{BatchProgress, BatchStatus};
use std::collections::HashMap;
use uuid::Uuid;

/// Keyed store of [`BatchProgress`] records.
#[derive(Debug, Default)]
pub struct BatchRegistry {
    batches: HashMap<Uuid, BatchProgress>,
}

impl BatchRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            batches: HashMap::new(),
        }
    }

    /// Insert a record under its batch id.
    pub fn insert(&mut self, progress: BatchProgress) {
        self.batches.insert(progress.batch_id, progress);
    }

    /// Look up a record.
    pub fn get(&self, batch_id: &Uuid) -> Option<&BatchProgress> {
        self.batches.get(batch_id)
    }

    /// Look up a record for mutation.
    pub fn get_mut(&mut self, batch_id: &Uuid) -> Option<&mut BatchProgress> {
        self.batches.get_mut(batch_id)
    }

    /// Remove a record wholesale.
    pub fn remove(&mut self, batch_id: &Uuid) -> Option<BatchProgress> {
        self.batches.remove(batch_id)
    }

    /// Number of records, terminal included.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Whether the registry holds no records.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Number of batches counting against the admission cap.
    pub fn active_count(&self) -> usize {
        self.batches
            .values()
            .filter(|p| !p.status.is_terminal())
            .count()
    }

    /// Snapshot of non-terminal batch ids.
    pub fn active_ids(&self) -> Vec<Uuid> {
        self.batches
            .values()
            .filter(|p| !p.status.is_terminal())
            .map(|p| p.batch_id)
            .collect()
    }

    /// Ids of terminal batches that finished before `cutoff`.
    pub fn evictable_ids(&self, cutoff: DateTime<Utc>) -> Vec<Uuid> {
        self.batches
            .values()
            .filter(|p| {
                p.status.is_terminal() && p.finished_at.is_some_and(|t| t < cutoff)
            })
            .map(|p| p.batch_id)
            .collect()
    }
}
