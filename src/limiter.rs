use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting admission gate for in-flight network calls.
#[derive(Debug, Clone)]
pub struct Limiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// A held slot. Dropping it frees the slot.
pub type Permit = OwnedSemaphorePermit;

impl Limiter {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            bail!("concurrency must be at least 1");
        }
        Ok(Limiter {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    /// Waits until a slot is free. Waiters are admitted in FIFO order.
    pub async fn acquire(&self) -> Permit {
        // The semaphore is private and never closed.
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("limiter semaphore is never closed")
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
