//! Counters for one recovery run
//!
//! - Counters only, monotonic
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Run counters, shared by reference across concurrent tasks
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    pages_listed: AtomicU64,
    events_scanned: AtomicU64,
    objects_resolved: AtomicU64,
    probes_issued: AtomicU64,
    probe_failures: AtomicU64,
    copies_succeeded: AtomicU64,
    copies_failed: AtomicU64,
    thaws_requested: AtomicU64,
    thaws_failed: AtomicU64,
}

/// Point-in-time copy of all counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub pages_listed: u64,
    pub events_scanned: u64,
    pub objects_resolved: u64,
    pub probes_issued: u64,
    pub probe_failures: u64,
    pub copies_succeeded: u64,
    pub copies_failed: u64,
    pub thaws_requested: u64,
    pub thaws_failed: u64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Resolution

    /// Record one listing page and the events it carried
    pub fn record_page(&self, events: u64) {
        self.pages_listed.fetch_add(1, Ordering::Relaxed);
        self.events_scanned.fetch_add(events, Ordering::Relaxed);
    }

    pub fn set_objects_resolved(&self, count: u64) {
        self.objects_resolved.store(count, Ordering::Relaxed);
    }

    // Classification

    pub fn increment_probes(&self) {
        self.probes_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_probe_failures(&self) {
        self.probe_failures.fetch_add(1, Ordering::Relaxed);
    }

    // Recovery

    pub fn increment_copies(&self) {
        self.copies_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_copy_failures(&self) {
        self.copies_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_thaws(&self) {
        self.thaws_requested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_thaw_failures(&self) {
        self.thaws_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy out all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pages_listed: self.pages_listed.load(Ordering::Relaxed),
            events_scanned: self.events_scanned.load(Ordering::Relaxed),
            objects_resolved: self.objects_resolved.load(Ordering::Relaxed),
            probes_issued: self.probes_issued.load(Ordering::Relaxed),
            probe_failures: self.probe_failures.load(Ordering::Relaxed),
            copies_succeeded: self.copies_succeeded.load(Ordering::Relaxed),
            copies_failed: self.copies_failed.load(Ordering::Relaxed),
            thaws_requested: self.thaws_requested.load(Ordering::Relaxed),
            thaws_failed: self.thaws_failed.load(Ordering::Relaxed),
        }
    }
}

impl MetricsSnapshot {
    /// Total per-object failures
    pub fn failures(&self) -> u64 {
        self.probe_failures + self.copies_failed + self.thaws_failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_zeroed() {
        assert_eq!(MetricsRegistry::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_record_page_accumulates() {
        let metrics = MetricsRegistry::new();
        metrics.record_page(1000);
        metrics.record_page(12);

        let snap = metrics.snapshot();
        assert_eq!(snap.pages_listed, 2);
        assert_eq!(snap.events_scanned, 1012);
    }

    #[test]
    fn test_failures_total() {
        let metrics = MetricsRegistry::new();
        metrics.increment_probe_failures();
        metrics.increment_copy_failures();
        metrics.increment_thaw_failures();
        metrics.increment_copies();

        assert_eq!(metrics.snapshot().failures(), 3);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = MetricsRegistry::new();
        metrics.increment_thaws();

        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["thaws_requested"], 1);
    }
}
