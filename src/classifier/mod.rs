//! # Tier Classification
//!
//! Splits a resolved set into objects that can be copied now and objects
//! that need a thaw first. Only versions listed as cold are probed; a cold
//! version whose thaw is already complete or in flight is treated as
//! standard so no duplicate restore request goes out.
//!
//! Probes run through the shared worker budget. A failed probe is recorded
//! against its object and never stops the others.

use std::sync::Arc;

use crate::dispatch::{fan_out, CancelFlag, WorkerSlots};
use crate::observability::{log_event, Event, MetricsRegistry, ObservationScope};
use crate::resolver::{ResolvedObject, ResolvedSet};
use crate::store::{StorageTier, StoreError, StoreResult, TierProbe};

/// Resolve the effective tier of one object
pub async fn classify<P>(object: ResolvedObject, probe: &P) -> StoreResult<ResolvedObject>
where
    P: TierProbe + ?Sized,
{
    if object.tier == StorageTier::Standard {
        return Ok(object);
    }

    let status = probe.probe_tier(&object.key, &object.version_id).await?;
    let tier = if status.already_thawed_or_standard {
        StorageTier::Standard
    } else {
        StorageTier::Cold
    };

    Ok(ResolvedObject { tier, ..object })
}

/// A resolved set partitioned by effective tier
#[derive(Debug, Clone, Default)]
pub struct ClassifiedSet {
    /// Readable now; candidates for copy
    pub standard: Vec<ResolvedObject>,
    /// Frozen; candidates for a thaw request
    pub cold: Vec<ResolvedObject>,
    /// Objects whose probe failed, with the failure
    pub probe_failures: Vec<(ResolvedObject, StoreError)>,
    /// Cold objects never probed because the run was cancelled
    pub unscheduled: Vec<ResolvedObject>,
    pub cancelled: bool,
}

impl ClassifiedSet {
    /// Objects that made it into a partition or failed trying
    pub fn total(&self) -> usize {
        self.standard.len() + self.cold.len() + self.probe_failures.len() + self.unscheduled.len()
    }
}

/// Classify every object in `resolved`, probing cold ones concurrently
pub async fn classify_all<P>(
    resolved: ResolvedSet,
    probe: Arc<P>,
    slots: &WorkerSlots,
    cancel: &CancelFlag,
    metrics: Arc<MetricsRegistry>,
) -> ClassifiedSet
where
    P: TierProbe + ?Sized + 'static,
{
    let mut classified = ClassifiedSet::default();
    let mut to_probe = Vec::new();

    for object in resolved {
        match object.tier {
            StorageTier::Standard => classified.standard.push(object),
            StorageTier::Cold => to_probe.push(object),
        }
    }

    let probes = to_probe.len().to_string();
    let scope = ObservationScope::with_fields("CLASSIFY", &[("probes", &probes)]);

    let out = fan_out(to_probe, slots, cancel, |object: ResolvedObject| {
        let probe = Arc::clone(&probe);
        let metrics = Arc::clone(&metrics);
        async move {
            metrics.increment_probes();
            classify(object, probe.as_ref()).await
        }
    })
    .await;

    for (object, result) in out.completed {
        let failure = match result {
            Ok(Ok(resolved)) => {
                match resolved.tier {
                    StorageTier::Standard => classified.standard.push(resolved),
                    StorageTier::Cold => classified.cold.push(resolved),
                }
                continue;
            }
            Ok(Err(err)) => err,
            Err(reason) => StoreError::Internal(reason),
        };

        metrics.increment_probe_failures();
        log_event(
            Event::ProbeFailed,
            &[
                ("key", &object.key),
                ("version_id", &object.version_id),
                ("error", &failure.to_string()),
            ],
        );
        classified.probe_failures.push((object, failure));
    }

    classified.unscheduled = out.unscheduled;
    classified.cancelled = out.cancelled;

    scope.complete_with_fields(&[
        ("standard", &classified.standard.len().to_string()),
        ("cold", &classified.cold.len().to_string()),
        ("probe_failures", &classified.probe_failures.len().to_string()),
    ]);

    classified
}
