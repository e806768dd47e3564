//! Recovery orchestration
//!
//! Turns a classified set into copy and thaw actions:
//! - frozen objects get exactly one thaw request and are never copied
//! - readable objects get exactly one copy and are never thawed
//!
//! Both kinds share one worker budget. Thaws are dispatched first, then
//! copies. The destination is provisioned once, before dispatch, and only
//! when at least one copy will go out. Per-object failures land in that
//! object's outcome; only an unusable destination aborts the run.

use std::sync::Arc;

use crate::classifier::{classify_all, ClassifiedSet};
use crate::dispatch::{fan_out, CancelFlag, WorkerSlots};
use crate::observability::{log_event, Event, MetricsRegistry, ObservationScope};
use crate::resolver::{ResolvedObject, ResolvedSet};
use crate::store::{Destination, RecoverySink, ThawOptions, VersionStore};

use super::errors::{RecoveryError, RecoveryResult};
use super::outcome::{ErrorDetail, RecoveryAction, RecoveryOutcome, RecoveryReport};
use super::policy::RecoveryPolicy;

#[derive(Debug, Clone)]
enum Job {
    Thaw(ResolvedObject),
    Copy(ResolvedObject),
}

impl Job {
    fn object(&self) -> &ResolvedObject {
        match self {
            Job::Thaw(object) | Job::Copy(object) => object,
        }
    }

    fn action(&self) -> RecoveryAction {
        match self {
            Job::Thaw(_) => RecoveryAction::RestoreRequested,
            Job::Copy(_) => RecoveryAction::Copied,
        }
    }
}

/// Drives classification and recovery against one store
pub struct Orchestrator<S: ?Sized> {
    store: Arc<S>,
    slots: WorkerSlots,
    cancel: CancelFlag,
    metrics: Arc<MetricsRegistry>,
}

impl<S> Orchestrator<S>
where
    S: VersionStore + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, slots: WorkerSlots) -> Self {
        Self {
            store,
            slots,
            cancel: CancelFlag::new(),
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn slots(&self) -> &WorkerSlots {
        &self.slots
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Probe cold objects through this orchestrator's budget
    pub async fn classify(&self, resolved: ResolvedSet) -> ClassifiedSet {
        classify_all(
            resolved,
            Arc::clone(&self.store),
            &self.slots,
            &self.cancel,
            Arc::clone(&self.metrics),
        )
        .await
    }

    /// Classify then recover a resolved set
    pub async fn recover_resolved(
        &self,
        resolved: ResolvedSet,
        destination: &Destination,
        policy: &RecoveryPolicy,
    ) -> RecoveryResult<RecoveryReport> {
        let classified = self.classify(resolved).await;
        self.recover(classified, destination, policy).await
    }

    /// Dispatch one action per object the policy allows
    pub async fn recover(
        &self,
        classified: ClassifiedSet,
        destination: &Destination,
        policy: &RecoveryPolicy,
    ) -> RecoveryResult<RecoveryReport> {
        let ClassifiedSet {
            standard,
            cold,
            probe_failures,
            unscheduled,
            cancelled,
        } = classified;

        let mut report = RecoveryReport {
            unscheduled: unscheduled.len(),
            cancelled,
            ..RecoveryReport::default()
        };

        let mut jobs = Vec::with_capacity(standard.len() + cold.len());
        if policy.recover_cold {
            jobs.extend(cold.into_iter().map(Job::Thaw));
        } else {
            report.skipped_cold = cold.len() + probe_failures.len();
        }
        let copies = if policy.recover_standard { standard.len() } else { 0 };
        if policy.recover_standard {
            jobs.extend(standard.into_iter().map(Job::Copy));
        } else {
            report.skipped_standard = standard.len();
        }

        if copies > 0 && !self.cancel.is_cancelled() {
            self.provision(destination).await?;
        }

        let dest = destination.to_string();
        let scope = ObservationScope::with_fields(
            "RECOVER",
            &[("destination", &dest), ("actions", &jobs.len().to_string())],
        );

        let thaw = policy.thaw;
        let out = fan_out(jobs, &self.slots, &self.cancel, |job: Job| {
            let store = Arc::clone(&self.store);
            let metrics = Arc::clone(&self.metrics);
            let destination = destination.clone();
            async move { execute(store.as_ref(), &metrics, &job, &destination, thaw).await }
        })
        .await;

        for (job, result) in out.completed {
            let outcome = result.unwrap_or_else(|reason| {
                let object = job.object();
                RecoveryOutcome::failed(
                    object.key.as_str(),
                    object.version_id.as_str(),
                    job.action(),
                    ErrorDetail::new("task_failed", reason),
                )
            });
            report.outcomes.push(outcome);
        }

        if policy.recover_cold {
            for (object, err) in probe_failures {
                report.outcomes.push(RecoveryOutcome::failed(
                    object.key,
                    object.version_id,
                    RecoveryAction::RestoreRequested,
                    ErrorDetail::from(&err),
                ));
            }
        }

        report.unscheduled += out.unscheduled.len();
        report.cancelled |= out.cancelled;

        if report.cancelled {
            log_event(
                Event::RecoveryCancelled,
                &[("unscheduled", &report.unscheduled.to_string())],
            );
        }

        scope.complete_with_fields(&[
            ("succeeded", &report.succeeded().to_string()),
            ("failed", &report.failed().to_string()),
        ]);

        Ok(report)
    }

    async fn provision(&self, destination: &Destination) -> RecoveryResult<()> {
        let dest = destination.to_string();
        match self.store.ensure_destination(destination).await {
            Ok(()) => {
                log_event(Event::DestinationReady, &[("destination", &dest)]);
                Ok(())
            }
            Err(err) => {
                log_event(
                    Event::DestinationUnavailable,
                    &[("destination", &dest), ("error", &err.to_string())],
                );
                Err(RecoveryError::destination_unavailable(destination, err))
            }
        }
    }
}

async fn execute<S>(
    store: &S,
    metrics: &MetricsRegistry,
    job: &Job,
    destination: &Destination,
    thaw: ThawOptions,
) -> RecoveryOutcome
where
    S: RecoverySink + ?Sized,
{
    let object = job.object();
    let result = match job {
        Job::Thaw(_) => store.request_thaw(&object.key, &object.version_id, thaw).await,
        Job::Copy(_) => {
            store
                .fetch_or_copy(&object.key, &object.version_id, destination)
                .await
        }
    };

    let fields = [("key", object.key.as_str()), ("version_id", object.version_id.as_str())];
    match (job, result) {
        (Job::Thaw(_), Ok(())) => {
            metrics.increment_thaws();
            log_event(Event::ThawRequested, &fields);
        }
        (Job::Copy(_), Ok(())) => {
            metrics.increment_copies();
            log_event(Event::CopyComplete, &fields);
        }
        (Job::Thaw(_), Err(err)) => {
            metrics.increment_thaw_failures();
            log_event(Event::ThawFailed, &[fields[0], fields[1], ("error", &err.to_string())]);
            return RecoveryOutcome::failed(
                object.key.as_str(),
                object.version_id.as_str(),
                job.action(),
                ErrorDetail::from(&err),
            );
        }
        (Job::Copy(_), Err(err)) => {
            metrics.increment_copy_failures();
            log_event(Event::CopyFailed, &[fields[0], fields[1], ("error", &err.to_string())]);
            return RecoveryOutcome::failed(
                object.key.as_str(),
                object.version_id.as_str(),
                job.action(),
                ErrorDetail::from(&err),
            );
        }
    }

    RecoveryOutcome::succeeded(object.key.as_str(), object.version_id.as_str(), job.action())
}
