//! Per-object outcomes and the run report

use serde::Serialize;

use crate::store::StoreError;

/// What was attempted for an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    /// Content copied to the destination
    Copied,
    /// Thaw requested; content stays in the source until a later run
    RestoreRequested,
}

/// A failure attached to one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
}

impl ErrorDetail {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl From<&StoreError> for ErrorDetail {
    fn from(err: &StoreError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

/// Result of one attempted action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryOutcome {
    pub key: String,
    pub version_id: String,
    pub action: RecoveryAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl RecoveryOutcome {
    pub fn succeeded(key: impl Into<String>, version_id: impl Into<String>, action: RecoveryAction) -> Self {
        Self {
            key: key.into(),
            version_id: version_id.into(),
            action,
            error: None,
        }
    }

    pub fn failed(
        key: impl Into<String>,
        version_id: impl Into<String>,
        action: RecoveryAction,
        error: ErrorDetail,
    ) -> Self {
        Self {
            key: key.into(),
            version_id: version_id.into(),
            action,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything the orchestrator did in one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecoveryReport {
    /// One entry per attempted action in dispatch order (thaws, then
    /// copies), followed by objects whose tier probe failed
    pub outcomes: Vec<RecoveryOutcome>,
    /// Readable objects left alone by policy
    pub skipped_standard: usize,
    /// Frozen objects left alone by policy
    pub skipped_cold: usize,
    /// Objects never dispatched because the run was cancelled
    pub unscheduled: usize,
    pub cancelled: bool,
}

impl RecoveryReport {
    pub fn count(&self, action: RecoveryAction) -> usize {
        self.outcomes.iter().filter(|o| o.action == action).count()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn outcome(&self, key: &str) -> Option<&RecoveryOutcome> {
        self.outcomes.iter().find(|o| o.key == key)
    }
}
