//! Worker slots
//!
//! A counting semaphore gating how many remote operations are in flight.
//! Discipline: acquire a slot before issuing work, release it when the work
//! completes or fails. Every acquire/release pair is counted so the bound
//! can be checked after the fact.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Default number of simultaneous remote operations
pub const DEFAULT_CONCURRENCY: usize = 50;

#[derive(Debug, Default)]
struct SlotStats {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    acquired: AtomicU64,
    released: AtomicU64,
}

/// Fixed-size worker budget shared by probes, copies and thaw requests
#[derive(Debug, Clone)]
pub struct WorkerSlots {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    stats: Arc<SlotStats>,
}

/// A held slot; released on drop
#[derive(Debug)]
pub struct SlotGuard {
    _permit: OwnedSemaphorePermit,
    stats: Arc<SlotStats>,
}

impl WorkerSlots {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity.get())),
            capacity: capacity.get(),
            stats: Arc::new(SlotStats::default()),
        }
    }

    /// Wait for a free slot
    pub async fn acquire(&self) -> Result<SlotGuard, AcquireError> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;

        let now = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak.fetch_max(now, Ordering::SeqCst);
        self.stats.acquired.fetch_add(1, Ordering::SeqCst);

        Ok(SlotGuard {
            _permit: permit,
            stats: Arc::clone(&self.stats),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held
    pub fn in_flight(&self) -> usize {
        self.stats.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of slots ever held at once
    pub fn peak_in_flight(&self) -> usize {
        self.stats.peak.load(Ordering::SeqCst)
    }

    pub fn acquired(&self) -> u64 {
        self.stats.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> u64 {
        self.stats.released.load(Ordering::SeqCst)
    }
}

impl Default for WorkerSlots {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_CONCURRENCY).unwrap_or(NonZeroUsize::MIN))
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        // Runs before `_permit` is returned to the semaphore
        self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.stats.released.fetch_add(1, Ordering::SeqCst);
    }
}
