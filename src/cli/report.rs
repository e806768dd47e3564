//! Final JSON report of a run

use serde::Serialize;

use crate::classifier::ClassifiedSet;
use crate::observability::MetricsSnapshot;
use crate::recovery::{RecoveryOutcome, RecoveryReport};
use crate::resolver::ResolvedObject;
use crate::store::Destination;

/// Object counts per partition after classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PartitionCounts {
    pub resolved: usize,
    pub standard: usize,
    pub cold: usize,
    pub probe_failures: usize,
}

impl PartitionCounts {
    pub fn of(classified: &ClassifiedSet) -> Self {
        Self {
            resolved: classified.total(),
            standard: classified.standard.len(),
            cold: classified.cold.len(),
            probe_failures: classified.probe_failures.len(),
        }
    }
}

/// What a dry run would have done
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub copy: Vec<ResolvedObject>,
    pub thaw: Vec<ResolvedObject>,
}

/// Everything printed on stdout at the end of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub bucket: String,
    pub destination: Destination,
    pub target: String,
    pub prefix: String,
    pub dry_run: bool,
    pub counts: PartitionCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    pub outcomes: Vec<RecoveryOutcome>,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped_standard: usize,
    pub skipped_cold: usize,
    pub unscheduled: usize,
    pub cancelled: bool,
    pub metrics: MetricsSnapshot,
}

impl RunReport {
    /// Fold the recovery result into the report
    pub fn with_recovery(mut self, recovery: RecoveryReport) -> Self {
        self.succeeded = recovery.succeeded();
        self.failed = recovery.failed();
        self.skipped_standard = recovery.skipped_standard;
        self.skipped_cold = recovery.skipped_cold;
        self.unscheduled = recovery.unscheduled;
        self.cancelled = recovery.cancelled;
        self.outcomes = recovery.outcomes;
        self
    }
}
