//! Semaphore-based worker pool for per-rental sweep units.
//!
//! The [`WorkerPool`] bounds how many per-rental units run concurrently
//! within one sweep pass. Units touch disjoint rows, so the limit exists
//! to keep the `SQLite` pool from being saturated, not for ordering.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Default maximum number of concurrent per-rental units.
const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// A permit granting the right to run one per-rental unit.
///
/// When dropped, the permit is automatically returned to the pool.
pub struct PoolPermit {
    _permit: OwnedSemaphorePermit,
}

/// Semaphore-based concurrency pool for sweep work.
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
}

impl WorkerPool {
    /// Create a new pool with the given concurrency limit.
    ///
    /// A limit of zero falls back to the default.
    pub fn new(max_concurrency: usize) -> Self {
        let limit = if max_concurrency == 0 {
            DEFAULT_MAX_CONCURRENCY
        } else {
            max_concurrency
        };

        debug!(max_concurrency = limit, "WorkerPool created");

        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            max_concurrency: limit,
        }
    }

    /// Acquire a permit to run one unit.
    ///
    /// Returns `None` if a permit cannot be acquired immediately (pool full).
    pub fn try_acquire(&self) -> Option<PoolPermit> {
        let permit = Arc::clone(&self.semaphore).try_acquire_owned().ok()?;
        Some(PoolPermit { _permit: permit })
    }

    /// Acquire a permit, waiting until one becomes available.
    pub async fn acquire(&self) -> Result<PoolPermit, PoolError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;
        Ok(PoolPermit { _permit: permit })
    }

    /// Maximum concurrency limit.
    pub const fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Number of available permits (slots) remaining.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENCY)
    }
}

/// Errors from the worker pool.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The semaphore was closed (pool shut down).
    #[error("Worker pool has been closed")]
    Closed,
}
