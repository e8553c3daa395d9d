//! Periodic eviction of finished batches.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::controller::BatchController;

/// Periodic sweep that evicts old terminal batches from the registry.
///
/// A single spawned loop drives the sweeps, so two sweeps never run
/// concurrently. The loop is uncoupled from request handling; it only calls
/// [`BatchController::cleanup`].
pub struct Reaper {
    /// Controller whose registry is swept
    controller: Arc<BatchController>,
    /// Running flag
    running: Arc<RwLock<bool>>,
}

impl Reaper {
    /// Create a reaper for a controller.
    pub fn new(controller: Arc<BatchController>) -> Self {
        Self {
            controller,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Start the background sweep loop. A second call while running is a
    /// no-op.
    pub async fn start(&self) {
        let mut running = self.running.write().await;
        if *running {
            return;
        }
        *running = true;
        drop(running);

        let controller = Arc::clone(&self.controller);
        let running = Arc::clone(&self.running);
        let period = controller.config().reaper_interval;

        info!(period_secs = period.as_secs_f64(), "reaper started");

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately; skip it so the first
            // sweep happens one full period after start.
            interval.tick().await;

            loop {
                interval.tick().await;
                if !*running.read().await {
                    debug!("reaper stopped");
                    break;
                }
                let evicted = controller.cleanup().await;
                if evicted > 0 {
                    debug!(evicted, "reaper sweep");
                }
            }
        });
    }

    /// Stop the sweep loop after its current tick.
    pub async fn stop(&self) {
        *self.running.write().await = false;
    }
}
