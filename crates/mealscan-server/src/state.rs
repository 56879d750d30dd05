//! Application state shared across request handlers.

use mealscan_core::ClassifierEngine;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Shared application state with backpressure on classification work.
#[derive(Clone)]
pub struct AppState {
    /// Engine reference - using Arc for cheap clones
    pub engine: Arc<ClassifierEngine>,
    /// Concurrency limiter to prevent resource exhaustion
    pub request_semaphore: Arc<Semaphore>,
}

impl AppState {
    pub fn new(engine: ClassifierEngine) -> Self {
        // Limit concurrent classifications; each one pins a CPU core for the
        // forward pass, so unbounded parallelism just thrashes.
        let max_concurrent = std::env::var("MAX_CONCURRENT_REQUESTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(32);

        Self {
            engine: Arc::new(engine),
            request_semaphore: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// Acquire a permit for concurrent request processing
    pub async fn acquire_permit(&self) -> tokio::sync::SemaphorePermit<'_> {
        self.request_semaphore
            .acquire()
            .await
            .expect("Semaphore should never be closed")
    }
}
