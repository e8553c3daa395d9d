//! Built-in corrector for the CLI `run` command.
//!
//! Echoes each chunk back unchanged after an optional delay, optionally
//! failing every nth call to exercise the failure paths end to end without
//! a real provider.

use async_trait::async_trait;
use prooflow_core::{Chunk, CorrectError, Corrector};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Corrector that returns chunk content verbatim.
pub struct EchoCorrector {
    /// Simulated per-chunk latency
    chunk_delay: Duration,
    /// Fail every nth call; `None` never fails
    fail_every: Option<usize>,
    /// Calls served so far
    calls: AtomicUsize,
}

impl EchoCorrector {
    /// Create an echo corrector. A `fail_every` of zero never fails.
    pub fn new(chunk_delay: Duration, fail_every: Option<usize>) -> Self {
        Self {
            chunk_delay,
            fail_every: fail_every.filter(|n| *n > 0),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Corrector for EchoCorrector {
    fn name(&self) -> &str {
        "echo"
    }

    async fn correct(&self, chunk: &Chunk) -> Result<String, CorrectError> {
        if !self.chunk_delay.is_zero() {
            tokio::time::sleep(self.chunk_delay).await;
        }

        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(n) = self.fail_every {
            if call % n == 0 {
                return Err(CorrectError::Provider(format!(
                    "injected failure on call {call}"
                )));
            }
        }

        Ok(chunk.content.clone())
    }
}
