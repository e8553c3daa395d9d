//! Batch lifecycle controller.
//!
//! Orchestrates admission, state transitions, timeout scheduling, and event
//! emission on top of the [`BatchRegistry`]. Every mutating operation takes
//! the registry write lock for its whole duration, so terminal-transition
//! detection never races with concurrent result deliveries.

use chrono::Utc;
use prooflow_core::{BatchError, BatchProgress, BatchStatus, ChunkOutcome, SplitPlan};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::registry::BatchRegistry;

/// Batch lifecycle events, each carrying a progress snapshot.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// A batch was admitted
    Created { batch_id: Uuid, progress: BatchProgress },
    /// A batch transitioned to processing
    Started { batch_id: Uuid, progress: BatchProgress },
    /// A chunk result was recorded on a still-running batch
    Progress { batch_id: Uuid, progress: BatchProgress },
    /// All chunks accounted for
    Completed { batch_id: Uuid, progress: BatchProgress },
    /// The per-batch timeout fired on a still-processing batch
    TimedOut { batch_id: Uuid, progress: BatchProgress },
    /// The batch was cancelled by the caller
    Cancelled { batch_id: Uuid, progress: BatchProgress },
}

impl BatchEvent {
    /// The batch this event belongs to.
    pub fn batch_id(&self) -> Uuid {
        match self {
            BatchEvent::Created { batch_id, .. }
            | BatchEvent::Started { batch_id, .. }
            | BatchEvent::Progress { batch_id, .. }
            | BatchEvent::Completed { batch_id, .. }
            | BatchEvent::TimedOut { batch_id, .. }
            | BatchEvent::Cancelled { batch_id, .. } => *batch_id,
        }
    }

    /// The progress snapshot carried by this event.
    pub fn progress(&self) -> &BatchProgress {
        match self {
            BatchEvent::Created { progress, .. }
            | BatchEvent::Started { progress, .. }
            | BatchEvent::Progress { progress, .. }
            | BatchEvent::Completed { progress, .. }
            | BatchEvent::TimedOut { progress, .. }
            | BatchEvent::Cancelled { progress, .. } => progress,
        }
    }
}

/// Configuration for the controller.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Admission cap: batches in `Pending` or `Processing`
    pub max_concurrent_batches: usize,
    /// One-shot timeout armed by `start`
    pub batch_timeout: Duration,
    /// Terminal batches older than this are evicted by `cleanup`
    pub max_batch_age: Duration,
    /// Sweep period of the reaper
    pub reaper_interval: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_batches: 5,
            batch_timeout: Duration::from_secs(300),
            max_batch_age: Duration::from_secs(3600),
            reaper_interval: Duration::from_secs(60),
        }
    }
}

/// Batch lifecycle controller.
pub struct BatchController {
    /// Configuration
    config: BatchConfig,
    /// The registry, guarded as a whole; batch volume is capped by admission
    registry: Arc<RwLock<BatchRegistry>>,
    /// Lifecycle event broadcast
    event_tx: broadcast::Sender<BatchEvent>,
}

impl BatchController {
    /// Create a controller with the given configuration.
    pub fn new(config: BatchConfig) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            config,
            registry: Arc::new(RwLock::new(BatchRegistry::new())),
            event_tx,
        }
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.event_tx.subscribe()
    }

    /// The controller's configuration.
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Admit a split plan as a new `Pending` batch.
    ///
    /// Fails fast with `CapacityExceeded` when the number of non-terminal
    /// batches has reached the configured cap; admission is the sole
    /// backpressure mechanism, so callers poll or wait for events rather
    /// than queue.
    pub async fn admit(&self, plan: &SplitPlan) -> Result<Uuid, BatchError> {
        let mut registry = self.registry.write().await;

        let active = registry.active_count();
        if active >= self.config.max_concurrent_batches {
            return Err(BatchError::CapacityExceeded {
                active,
                max: self.config.max_concurrent_batches,
            });
        }

        let batch_id = Uuid::new_v4();
        let progress = BatchProgress::new(batch_id, plan, Utc::now());
        let snapshot = progress.clone();
        registry.insert(progress);
        drop(registry);

        info!(%batch_id, total_chunks = plan.chunk_count, "batch admitted");
        self.emit(BatchEvent::Created {
            batch_id,
            progress: snapshot,
        });
        Ok(batch_id)
    }

    /// Transition a `Pending` batch to `Processing` and arm its timeout.
    ///
    /// The timeout task is fire-and-forget: it is not cancelled when the
    /// batch settles early, and re-checks the batch's state under the lock
    /// before acting, so a stale firing is a no-op.
    pub async fn start(&self, batch_id: Uuid) -> Result<(), BatchError> {
        let mut registry = self.registry.write().await;

        let progress = registry
            .get_mut(&batch_id)
            .ok_or(BatchError::NotFound(batch_id))?;

        if progress.status != BatchStatus::Pending {
            return Err(BatchError::InvalidState {
                batch_id,
                status: progress.status,
            });
        }

        progress.status = BatchStatus::Processing;
        progress.started_at = Some(Utc::now());
        let snapshot = progress.clone();
        drop(registry);

        info!(%batch_id, "batch started");
        self.emit(BatchEvent::Started {
            batch_id,
            progress: snapshot,
        });

        let registry = Arc::clone(&self.registry);
        let event_tx = self.event_tx.clone();
        let timeout = self.config.batch_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;

            let mut registry = registry.write().await;
            let Some(progress) = registry.get_mut(&batch_id) else {
                debug!(%batch_id, "timeout fired after eviction");
                return;
            };
            if progress.status != BatchStatus::Processing {
                debug!(%batch_id, status = %progress.status, "timeout fired on settled batch");
                return;
            }

            progress.status = BatchStatus::Failed;
            progress.finished_at = Some(Utc::now());
            let snapshot = progress.clone();
            drop(registry);

            warn!(%batch_id, "batch timed out");
            let _ = event_tx.send(BatchEvent::TimedOut {
                batch_id,
                progress: snapshot,
            });
        });

        Ok(())
    }

    /// Record one chunk's outcome. The single mutation entry point.
    ///
    /// Deliveries for unknown batches are logged and dropped: results may
    /// race eviction and must never crash the delivering collaborator.
    /// Re-delivery for an already-accounted chunk id is a no-op, and a
    /// terminal batch absorbs late results without leaving its state.
    pub async fn record_chunk_result(
        &self,
        batch_id: Uuid,
        chunk_id: Uuid,
        outcome: ChunkOutcome,
    ) {
        let mut registry = self.registry.write().await;

        let Some(progress) = registry.get_mut(&batch_id) else {
            warn!(%batch_id, %chunk_id, "chunk result for unknown batch dropped");
            return;
        };

        if !progress.expected.contains(&chunk_id) {
            warn!(%batch_id, %chunk_id, "chunk result for unknown chunk id dropped");
            return;
        }
        if progress.completed.contains_key(&chunk_id) || progress.failed.contains_key(&chunk_id)
        {
            debug!(%batch_id, %chunk_id, "duplicate chunk result ignored");
            return;
        }

        let was_terminal = progress.is_terminal();
        match outcome {
            ChunkOutcome::Corrected { text } => {
                progress.completed.insert(chunk_id, text);
            }
            ChunkOutcome::Failed { message } => {
                debug!(%batch_id, %chunk_id, %message, "chunk failed");
                progress.failed.insert(chunk_id, message);
            }
        }

        if was_terminal {
            debug!(%batch_id, %chunk_id, "late chunk result absorbed by terminal batch");
            return;
        }

        let now = Utc::now();
        let processed = progress.processed_chunks();

        if processed == progress.total_chunks {
            progress.status = if progress.failed.is_empty() {
                BatchStatus::Completed
            } else {
                BatchStatus::Failed
            };
            progress.finished_at = Some(now);
            let snapshot = progress.clone();
            drop(registry);

            info!(
                %batch_id,
                status = %snapshot.status,
                failed = snapshot.failed.len(),
                "batch settled"
            );
            self.emit(BatchEvent::Completed {
                batch_id,
                progress: snapshot,
            });
        } else {
            // Running average over chunks processed so far; noisy early in a
            // batch's life, recomputed on every update.
            let reference = progress.started_at.unwrap_or(progress.created_at);
            let avg = (now - reference) / processed as i32;
            let remaining = progress.remaining_chunks();
            progress.estimated_completion_at = Some(now + avg * remaining as i32);
            let snapshot = progress.clone();
            drop(registry);

            self.emit(BatchEvent::Progress {
                batch_id,
                progress: snapshot,
            });
        }
    }

    /// Progress snapshot for a batch; a deep copy, so mutating the returned
    /// value never touches registry state. `None` means not found, which is
    /// a normal outcome after eviction.
    pub async fn get_progress(&self, batch_id: Uuid) -> Option<BatchProgress> {
        self.registry.read().await.get(&batch_id).cloned()
    }

    /// Force a non-terminal batch to `Failed`.
    ///
    /// Returns `false` for unknown or already-terminal batches. In-flight
    /// external work is not interrupted; late results are absorbed without
    /// changing the terminal state.
    pub async fn cancel(&self, batch_id: Uuid) -> bool {
        let mut registry = self.registry.write().await;

        let Some(progress) = registry.get_mut(&batch_id) else {
            return false;
        };
        if progress.is_terminal() {
            return false;
        }

        progress.status = BatchStatus::Failed;
        progress.finished_at = Some(Utc::now());
        let snapshot = progress.clone();
        drop(registry);

        info!(%batch_id, "batch cancelled");
        self.emit(BatchEvent::Cancelled {
            batch_id,
            progress: snapshot,
        });
        true
    }

    /// Evict terminal batches that finished before `now - max_batch_age`.
    /// Returns the number evicted. Driven periodically by the reaper and
    /// callable manually.
    pub async fn cleanup(&self) -> usize {
        let max_age =
            chrono::Duration::from_std(self.config.max_batch_age).unwrap_or(chrono::Duration::MAX);
        let cutoff = Utc::now() - max_age;

        let mut registry = self.registry.write().await;
        let evictable = registry.evictable_ids(cutoff);
        for batch_id in &evictable {
            registry.remove(batch_id);
            debug!(%batch_id, "batch evicted");
        }
        drop(registry);

        if !evictable.is_empty() {
            info!(evicted = evictable.len(), "reaped finished batches");
        }
        evictable.len()
    }

    /// Cancel every active batch, then run a final cleanup.
    ///
    /// Iterates a snapshot of ids so cancellation never races a live
    /// registry view.
    pub async fn shutdown(&self) {
        let active = self.registry.read().await.active_ids();
        for batch_id in active {
            self.cancel(batch_id).await;
        }
        self.cleanup().await;
        info!("batch controller shut down");
    }

    fn emit(&self, event: BatchEvent) {
        // No receivers is fine; events are best-effort notifications.
        let _ = self.event_tx.send(event);
    }
}
