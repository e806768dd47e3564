//! Per-key accumulation of the latest visible events
//!
//! ## Rule
//!
//! Given a recovery point `T` and every event for key `K`, in any order:
//! 1. Ignore events with `last_modified > T`
//! 2. Keep the latest remaining content version `V` and the latest
//!    remaining delete marker `D`; on an exact tie within one kind the
//!    first event observed stays
//! 3. `K` resolves to `V` unless `D.last_modified > V.last_modified`
//!
//! A version and a delete marker with identical timestamps resolve to the
//! version. The result does not depend on the order events arrive in.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::store::VersionEvent;

use super::point::{RecoveryPoint, ResolvedObject, ResolvedSet};

/// Scan state for one resolver invocation
#[derive(Debug)]
pub struct HistoryAccumulator {
    point: RecoveryPoint,
    best_version: HashMap<String, VersionEvent>,
    best_delete_marker: HashMap<String, VersionEvent>,
    observed: u64,
}

impl HistoryAccumulator {
    pub fn new(point: RecoveryPoint) -> Self {
        Self {
            point,
            best_version: HashMap::new(),
            best_delete_marker: HashMap::new(),
            observed: 0,
        }
    }

    pub fn point(&self) -> RecoveryPoint {
        self.point
    }

    /// Events fed in so far, visible or not
    pub fn observed(&self) -> u64 {
        self.observed
    }

    /// Feed one event
    pub fn observe(&mut self, event: VersionEvent) {
        self.observed += 1;

        if !self.point.includes(event.last_modified) {
            return;
        }

        let best = if event.is_delete_marker {
            &mut self.best_delete_marker
        } else {
            &mut self.best_version
        };

        match best.entry(event.key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(event);
            }
            Entry::Occupied(mut slot) => {
                if event.last_modified > slot.get().last_modified {
                    slot.insert(event);
                }
            }
        }
    }

    /// Feed a batch of events
    pub fn observe_all(&mut self, events: impl IntoIterator<Item = VersionEvent>) {
        for event in events {
            self.observe(event);
        }
    }

    /// Apply delete-marker precedence and produce the resolved set
    pub fn finish(self) -> ResolvedSet {
        let HistoryAccumulator {
            best_version,
            best_delete_marker,
            ..
        } = self;

        best_version
            .into_iter()
            .filter(|(key, version)| match best_delete_marker.get(key) {
                Some(marker) => marker.last_modified <= version.last_modified,
                None => true,
            })
            .map(|(_, version)| ResolvedObject::from(version))
            .collect()
    }
}
