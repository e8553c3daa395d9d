//! Core types for Prooflow.
//!
//! This module contains the shared data structures used across the engine:
//!
//! ## Splitting
//! - [`SplitConfig`]: Configuration for the splitting algorithm
//! - [`Breakpoint`]: Preferred boundary classes, strongest to weakest
//! - [`Chunk`]: A bounded-size unit of splittable text
//! - [`SplitPlan`]: The immutable result of one split operation
//!
//! ## Batch tracking
//! - [`ChunkOutcome`]: Per-chunk delivery from the correction collaborator
//! - [`BatchStatus`]: Lifecycle state of a batch
//! - [`BatchProgress`]: The mutable aggregate tracking one batch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Range;
use uuid::Uuid;

use crate::error::SplitError;

// ============================================================================
// Splitting
// ============================================================================

/// A preferred boundary class used to choose where to cut a chunk.
///
/// Classes are tried in the order they appear in [`SplitConfig::breakpoints`];
/// the first class with a match inside the look-back window wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Breakpoint {
    /// Blank line between paragraphs (`\n\n`)
    Paragraph,
    /// Single line break
    Line,
    /// Sentence-ending punctuation (`.` `!` `?` and fullwidth forms)
    Sentence,
    /// Clause punctuation (`,` `;` `:` and fullwidth forms)
    Clause,
    /// Plain space
    Space,
}

/// Configuration for splitting a document into chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Maximum chunk size in characters
    pub max_chunk_size: usize,
    /// Characters of trailing text duplicated into the next chunk
    pub overlap_size: usize,
    /// Hard ceiling on input size in characters
    pub max_input_chars: usize,
    /// Keep paragraph breaks as the strongest boundary
    pub preserve_paragraphs: bool,
    /// Boundary classes tried strongest to weakest
    pub breakpoints: Vec<Breakpoint>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 1000,
            overlap_size: 50,
            max_input_chars: 100_000,
            preserve_paragraphs: true,
            breakpoints: vec![
                Breakpoint::Paragraph,
                Breakpoint::Line,
                Breakpoint::Sentence,
                Breakpoint::Clause,
                Breakpoint::Space,
            ],
        }
    }
}

impl SplitConfig {
    /// Check that the configuration is internally consistent.
    pub fn validate(&self) -> Result<(), SplitError> {
        if self.max_chunk_size == 0 {
            return Err(SplitError::InvalidConfig(
                "max_chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.overlap_size >= self.max_chunk_size {
            return Err(SplitError::InvalidConfig(format!(
                "overlap_size ({}) must be strictly less than max_chunk_size ({})",
                self.overlap_size, self.max_chunk_size
            )));
        }
        Ok(())
    }

    /// Breakpoint order with the paragraph preference withdrawn when
    /// `preserve_paragraphs` is off.
    pub fn effective_breakpoints(&self) -> Vec<Breakpoint> {
        if self.preserve_paragraphs {
            self.breakpoints.clone()
        } else {
            self.breakpoints
                .iter()
                .copied()
                .filter(|b| *b != Breakpoint::Paragraph)
                .collect()
        }
    }
}

/// A bounded-size unit of splittable text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Opaque identifier, stable for the lifetime of the batch
    pub id: Uuid,
    /// Trimmed text payload
    pub content: String,
    /// Pre-trim character offsets into the source text; adjacent ranges may
    /// overlap when `overlap_size > 0`
    pub original_range: Range<usize>,
    /// Character count of `content`
    pub length: usize,
    /// True only for the last chunk in the plan
    pub is_final: bool,
}

/// Immutable result of one split operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitPlan {
    /// Chunks in source order
    pub chunks: Vec<Chunk>,
    /// Character count of the source text
    pub total_characters: usize,
    /// Number of chunks produced
    pub chunk_count: usize,
    /// The size constraint the plan was produced under
    pub max_chunk_size: usize,
}

impl SplitPlan {
    /// Ids of every chunk in the plan.
    pub fn chunk_ids(&self) -> HashSet<Uuid> {
        self.chunks.iter().map(|c| c.id).collect()
    }
}

// ============================================================================
// Batch tracking
// ============================================================================

/// Delivery payload for one chunk from the correction collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ChunkOutcome {
    /// The chunk was corrected successfully
    Corrected {
        /// Corrected text for the chunk
        text: String,
    },
    /// Correction failed; the failure is a terminal fact about the chunk
    Failed {
        /// Error message from the collaborator
        message: String,
    },
}

/// Lifecycle state of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// Admitted, not yet started
    Pending,
    /// Started, chunk results arriving
    Processing,
    /// All chunks delivered with zero failures
    Completed,
    /// At least one failure, timeout, or cancellation
    Failed,
}

impl BatchStatus {
    /// Terminal states are left only by eviction, never by transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Completed | BatchStatus::Failed)
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchStatus::Pending => write!(f, "pending"),
            BatchStatus::Processing => write!(f, "processing"),
            BatchStatus::Completed => write!(f, "completed"),
            BatchStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Mutable aggregate tracking execution of one [`SplitPlan`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchProgress {
    /// Unique key, generated at admission; never reused after eviction
    pub batch_id: Uuid,
    /// Number of chunks in the admitted plan
    pub total_chunks: usize,
    /// Chunk ids of the admitted plan; results for ids outside this set are
    /// ignored so `processed_chunks` can never exceed `total_chunks`
    pub expected: HashSet<Uuid>,
    /// Corrected text keyed by chunk id; re-delivery of a present id is a no-op
    pub completed: HashMap<Uuid, String>,
    /// Error message keyed by chunk id; same idempotence rule
    pub failed: HashMap<Uuid, String>,
    /// Current lifecycle state
    pub status: BatchStatus,
    /// When the batch was admitted
    pub created_at: DateTime<Utc>,
    /// When the batch was started
    pub started_at: Option<DateTime<Utc>>,
    /// Set only on the terminal transition
    pub finished_at: Option<DateTime<Utc>>,
    /// Recomputed after each chunk update from observed average chunk latency
    pub estimated_completion_at: Option<DateTime<Utc>>,
}

impl BatchProgress {
    /// Create a fresh `Pending` record for an admitted plan.
    pub fn new(batch_id: Uuid, plan: &SplitPlan, now: DateTime<Utc>) -> Self {
        Self {
            batch_id,
            total_chunks: plan.chunk_count,
            expected: plan.chunk_ids(),
            completed: HashMap::new(),
            failed: HashMap::new(),
            status: BatchStatus::Pending,
            created_at: now,
            started_at: None,
            finished_at: None,
            estimated_completion_at: None,
        }
    }

    /// Chunks accounted for so far, successes and failures alike.
    pub fn processed_chunks(&self) -> usize {
        self.completed.len() + self.failed.len()
    }

    /// Chunks still outstanding.
    pub fn remaining_chunks(&self) -> usize {
        self.total_chunks.saturating_sub(self.processed_chunks())
    }

    /// Whether the batch has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_with_chunks(n: usize) -> SplitPlan {
        let chunks: Vec<Chunk> = (0..n)
            .map(|i| Chunk {
                id: Uuid::new_v4(),
                content: format!("chunk {i}"),
                original_range: i * 10..(i + 1) * 10,
                length: 7,
                is_final: i + 1 == n,
            })
            .collect();
        SplitPlan {
            total_characters: n * 10,
            chunk_count: chunks.len(),
            max_chunk_size: 1000,
            chunks,
        }
    }

    // ==================== SplitConfig Tests ====================

    #[test]
    fn test_split_config_default() {
        let config = SplitConfig::default();
        assert_eq!(config.max_chunk_size, 1000);
        assert_eq!(config.overlap_size, 50);
        assert_eq!(config.max_input_chars, 100_000);
        assert!(config.preserve_paragraphs);
        assert_eq!(config.breakpoints[0], Breakpoint::Paragraph);
        assert_eq!(config.breakpoints.len(), 5);
    }

    #[test]
    fn test_split_config_validate_ok() {
        assert!(SplitConfig::default().validate().is_ok());
    }

    #[test]
    fn test_split_config_validate_overlap_too_large() {
        let config = SplitConfig {
            max_chunk_size: 100,
            overlap_size: 100,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("overlap_size"));
    }

    #[test]
    fn test_split_config_validate_zero_chunk_size() {
        let config = SplitConfig {
            max_chunk_size: 0,
            overlap_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_effective_breakpoints_without_paragraphs() {
        let config = SplitConfig {
            preserve_paragraphs: false,
            ..Default::default()
        };
        let effective = config.effective_breakpoints();
        assert!(!effective.contains(&Breakpoint::Paragraph));
        assert_eq!(effective[0], Breakpoint::Line);
    }

    // ==================== Chunk / SplitPlan Tests ====================

    #[test]
    fn test_chunk_serialization() {
        let chunk = Chunk {
            id: Uuid::new_v4(),
            content: "Hello world".to_string(),
            original_range: 0..11,
            length: 11,
            is_final: true,
        };

        let json = serde_json::to_string(&chunk).unwrap();
        let deserialized: Chunk = serde_json::from_str(&json).unwrap();

        assert_eq!(chunk.id, deserialized.id);
        assert_eq!(chunk.content, deserialized.content);
        assert_eq!(chunk.original_range, deserialized.original_range);
        assert!(deserialized.is_final);
    }

    #[test]
    fn test_split_plan_chunk_ids() {
        let plan = plan_with_chunks(3);
        let ids = plan.chunk_ids();
        assert_eq!(ids.len(), 3);
        for chunk in &plan.chunks {
            assert!(ids.contains(&chunk.id));
        }
    }

    // ==================== ChunkOutcome Tests ====================

    #[test]
    fn test_chunk_outcome_serialization() {
        let ok = ChunkOutcome::Corrected {
            text: "fixed".to_string(),
        };
        let json = serde_json::to_string(&ok).unwrap();
        assert!(json.contains("\"outcome\":\"corrected\""));

        let bad = ChunkOutcome::Failed {
            message: "provider unavailable".to_string(),
        };
        let json = serde_json::to_string(&bad).unwrap();
        assert!(json.contains("\"outcome\":\"failed\""));
    }

    // ==================== BatchStatus Tests ====================

    #[test]
    fn test_batch_status_serialization() {
        assert_eq!(
            serde_json::to_string(&BatchStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&BatchStatus::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn test_batch_status_terminal() {
        assert!(!BatchStatus::Pending.is_terminal());
        assert!(!BatchStatus::Processing.is_terminal());
        assert!(BatchStatus::Completed.is_terminal());
        assert!(BatchStatus::Failed.is_terminal());
    }

    #[test]
    fn test_batch_status_display() {
        assert_eq!(BatchStatus::Processing.to_string(), "processing");
        assert_eq!(BatchStatus::Failed.to_string(), "failed");
    }

    // ==================== BatchProgress Tests ====================

    #[test]
    fn test_batch_progress_new() {
        let plan = plan_with_chunks(4);
        let progress = BatchProgress::new(Uuid::new_v4(), &plan, Utc::now());

        assert_eq!(progress.total_chunks, 4);
        assert_eq!(progress.expected.len(), 4);
        assert_eq!(progress.processed_chunks(), 0);
        assert_eq!(progress.remaining_chunks(), 4);
        assert_eq!(progress.status, BatchStatus::Pending);
        assert!(progress.started_at.is_none());
        assert!(progress.finished_at.is_none());
    }

    #[test]
    fn test_batch_progress_processed_counts_both_sets() {
        let plan = plan_with_chunks(3);
        let mut progress = BatchProgress::new(Uuid::new_v4(), &plan, Utc::now());

        progress
            .completed
            .insert(plan.chunks[0].id, "ok".to_string());
        progress
            .failed
            .insert(plan.chunks[1].id, "boom".to_string());

        assert_eq!(progress.processed_chunks(), 2);
        assert_eq!(progress.remaining_chunks(), 1);
    }

    #[test]
    fn test_batch_progress_serialization() {
        let plan = plan_with_chunks(2);
        let progress = BatchProgress::new(Uuid::new_v4(), &plan, Utc::now());

        let json = serde_json::to_string(&progress).unwrap();
        let deserialized: BatchProgress = serde_json::from_str(&json).unwrap();

        assert_eq!(progress.batch_id, deserialized.batch_id);
        assert_eq!(progress.total_chunks, deserialized.total_chunks);
        assert_eq!(progress.status, deserialized.status);
    }
}
