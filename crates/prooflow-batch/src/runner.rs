//! Drives a corrector over a split plan.
//!
//! Glue between the engine and a [`Corrector`] implementation: starts the
//! batch, fans the chunks out with a bounded number of in-flight corrections,
//! and feeds every outcome back through the controller's single mutation
//! entry point. Provider-side parallelism beyond the bound stays the
//! corrector's own business.

use prooflow_core::{BatchProgress, ChunkOutcome, Corrector, Error, SplitPlan};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;
use uuid::Uuid;

use crate::controller::BatchController;

/// Run every chunk of an admitted plan through `corrector`, with at most
/// `max_concurrent` corrections in flight, and return the final progress.
pub async fn run_batch(
    controller: &Arc<BatchController>,
    batch_id: Uuid,
    plan: &SplitPlan,
    corrector: Arc<dyn Corrector>,
    max_concurrent: usize,
) -> Result<BatchProgress, Error> {
    controller.start(batch_id).await?;

    debug!(
        %batch_id,
        corrector = corrector.name(),
        chunks = plan.chunk_count,
        max_concurrent,
        "running batch"
    );

    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let mut handles = Vec::with_capacity(plan.chunks.len());

    for chunk in &plan.chunks {
        let semaphore = Arc::clone(&semaphore);
        let corrector = Arc::clone(&corrector);
        let controller = Arc::clone(controller);
        let chunk = chunk.clone();

        handles.push(tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire().await else {
                return;
            };

            let outcome = match corrector.correct(&chunk).await {
                Ok(text) => ChunkOutcome::Corrected { text },
                Err(e) => ChunkOutcome::Failed {
                    message: e.to_string(),
                },
            };
            controller
                .record_chunk_result(batch_id, chunk.id, outcome)
                .await;
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }

    controller
        .get_progress(batch_id)
        .await
        .ok_or_else(|| Error::Other(format!("batch {batch_id} evicted during run")))
}
