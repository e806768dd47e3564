//! # In-Memory Version Store
//!
//! Scriptable store for tests: explicit page layout, per-key
//! failure injection, artificial latency, and a record of every call made.
//! In-flight probe/copy/thaw calls are counted so callers can check the
//! concurrency bound they were given.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::backend::{EventSource, RecoverySink, TierProbe};
use super::errors::{StoreError, StoreResult};
use super::event::{Cursor, EventPage, TierStatus, VersionEvent};
use super::target::{Destination, ThawOptions};

/// A call observed by the memory store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List { cursor: Option<String> },
    Probe { key: String, version_id: String },
    EnsureDestination { destination: Destination },
    Copy { key: String, version_id: String },
    Thaw { key: String, version_id: String, options: ThawOptions },
}

#[derive(Debug, Default)]
struct Failures {
    listing_at_page: Option<usize>,
    probe_keys: HashSet<String>,
    copy_keys: HashSet<String>,
    thaw_keys: HashSet<String>,
    destination: bool,
}

/// Scriptable in-memory store
#[derive(Debug, Default)]
pub struct MemoryVersionStore {
    pages: Vec<Vec<VersionEvent>>,
    thawed: HashSet<(String, String)>,
    failures: Failures,
    latency: Option<Duration>,
    calls: Mutex<Vec<StoreCall>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MemoryVersionStore {
    /// Store serving exactly these pages, in this order
    pub fn with_pages(pages: Vec<Vec<VersionEvent>>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    /// Store serving `events` split into pages of `page_size`
    pub fn from_events(events: Vec<VersionEvent>, page_size: usize) -> Self {
        let pages = events
            .chunks(page_size.max(1))
            .map(|chunk| chunk.to_vec())
            .collect();
        Self::with_pages(pages)
    }

    /// Report this cold version as already thawed (or thawing)
    pub fn mark_thawed(mut self, key: &str, version_id: &str) -> Self {
        self.thawed.insert((key.to_string(), version_id.to_string()));
        self
    }

    /// Fail the listing call for page `page` (0-based)
    pub fn fail_listing_at(mut self, page: usize) -> Self {
        self.failures.listing_at_page = Some(page);
        self
    }

    pub fn fail_probe(mut self, key: &str) -> Self {
        self.failures.probe_keys.insert(key.to_string());
        self
    }

    pub fn fail_copy(mut self, key: &str) -> Self {
        self.failures.copy_keys.insert(key.to_string());
        self
    }

    pub fn fail_thaw(mut self, key: &str) -> Self {
        self.failures.thaw_keys.insert(key.to_string());
        self
    }

    pub fn fail_destination(mut self) -> Self {
        self.failures.destination = true;
        self
    }

    /// Delay every probe, copy and thaw call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Every call made so far, in call order
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Keys passed to `fetch_or_copy`
    pub fn copied_keys(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                StoreCall::Copy { key, .. } => Some(key),
                _ => None,
            })
            .collect()
    }

    /// Keys passed to `request_thaw`
    pub fn thawed_keys(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                StoreCall::Thaw { key, .. } => Some(key),
                _ => None,
            })
            .collect()
    }

    /// Keys passed to `probe_tier`
    pub fn probed_keys(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                StoreCall::Probe { key, .. } => Some(key),
                _ => None,
            })
            .collect()
    }

    /// Highest number of probe/copy/thaw calls observed in flight at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: StoreCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    async fn in_flight<T>(&self, result: StoreResult<T>) -> StoreResult<T> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        } else {
            tokio::task::yield_now().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl EventSource for MemoryVersionStore {
    async fn list_version_events(
        &self,
        prefix: &str,
        cursor: Option<&Cursor>,
    ) -> StoreResult<EventPage> {
        self.record(StoreCall::List {
            cursor: cursor.map(|c| c.to_string()),
        });

        let index = match cursor {
            Some(c) => c
                .as_str()
                .parse::<usize>()
                .map_err(|_| StoreError::InvalidCursor(c.to_string()))?,
            None => 0,
        };

        if self.failures.listing_at_page == Some(index) {
            return Err(StoreError::Unavailable(format!("listing page {} failed", index)));
        }

        let events = match self.pages.get(index) {
            Some(page) => page
                .iter()
                .filter(|e| e.key.starts_with(prefix))
                .cloned()
                .collect(),
            None if index == 0 => Vec::new(),
            None => return Err(StoreError::InvalidCursor(index.to_string())),
        };

        if index + 1 < self.pages.len() {
            Ok(EventPage::with_next(events, Cursor::new((index + 1).to_string())))
        } else {
            Ok(EventPage::last(events))
        }
    }
}

#[async_trait]
impl TierProbe for MemoryVersionStore {
    async fn probe_tier(&self, key: &str, version_id: &str) -> StoreResult<TierStatus> {
        self.record(StoreCall::Probe {
            key: key.to_string(),
            version_id: version_id.to_string(),
        });

        let result = if self.failures.probe_keys.contains(key) {
            Err(StoreError::Unavailable(format!("probe of {} failed", key)))
        } else if self
            .thawed
            .contains(&(key.to_string(), version_id.to_string()))
        {
            Ok(TierStatus::readable())
        } else {
            Ok(TierStatus::frozen())
        };

        self.in_flight(result).await
    }
}

#[async_trait]
impl RecoverySink for MemoryVersionStore {
    async fn ensure_destination(&self, destination: &Destination) -> StoreResult<()> {
        self.record(StoreCall::EnsureDestination {
            destination: destination.clone(),
        });

        if self.failures.destination {
            Err(StoreError::Unavailable(format!(
                "destination {} rejected writes",
                destination
            )))
        } else {
            Ok(())
        }
    }

    async fn fetch_or_copy(
        &self,
        key: &str,
        version_id: &str,
        _destination: &Destination,
    ) -> StoreResult<()> {
        self.record(StoreCall::Copy {
            key: key.to_string(),
            version_id: version_id.to_string(),
        });

        let result = if self.failures.copy_keys.contains(key) {
            Err(StoreError::IoError(format!("copy of {} failed", key)))
        } else {
            Ok(())
        };

        self.in_flight(result).await
    }

    async fn request_thaw(
        &self,
        key: &str,
        version_id: &str,
        options: ThawOptions,
    ) -> StoreResult<()> {
        self.record(StoreCall::Thaw {
            key: key.to_string(),
            version_id: version_id.to_string(),
            options,
        });

        let result = if self.failures.thaw_keys.contains(key) {
            Err(StoreError::Unavailable(format!("thaw of {} rejected", key)))
        } else {
            Ok(())
        };

        self.in_flight(result).await
    }
}
