//! Recovery error types
//!
//! Only run-level failures live here. A failed copy or thaw for one object
//! is not an error of the run; it is recorded in that object's outcome.

use std::fmt;

use crate::store::{Destination, StoreError};

/// Recovery error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryErrorCode {
    /// The destination cannot accept writes
    DestinationUnavailable,
    /// Scheduling stopped before every object was dispatched
    Cancelled,
    /// At least one dispatched copy, thaw or probe failed
    ActionsFailed,
}

impl RecoveryErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryErrorCode::DestinationUnavailable => "REWIND_RECOVERY_DESTINATION_UNAVAILABLE",
            RecoveryErrorCode::Cancelled => "REWIND_RECOVERY_CANCELLED",
            RecoveryErrorCode::ActionsFailed => "REWIND_RECOVERY_ACTIONS_FAILED",
        }
    }
}

impl fmt::Display for RecoveryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Run-level recovery error
#[derive(Debug)]
pub struct RecoveryError {
    code: RecoveryErrorCode,
    message: String,
    source: Option<StoreError>,
}

impl RecoveryError {
    pub fn destination_unavailable(destination: &Destination, source: StoreError) -> Self {
        Self {
            code: RecoveryErrorCode::DestinationUnavailable,
            message: format!("destination {} cannot accept writes", destination),
            source: Some(source),
        }
    }

    /// `unscheduled` objects were never dispatched
    pub fn cancelled(unscheduled: usize) -> Self {
        Self {
            code: RecoveryErrorCode::Cancelled,
            message: format!("run cancelled with {} object(s) not dispatched", unscheduled),
            source: None,
        }
    }

    /// `failed` of `total` outcomes carry an error
    pub fn actions_failed(failed: usize, total: usize) -> Self {
        Self {
            code: RecoveryErrorCode::ActionsFailed,
            message: format!("{} of {} object(s) failed to recover", failed, total),
            source: None,
        }
    }

    pub fn code(&self) -> RecoveryErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RecoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code, self.message)?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for RecoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

pub type RecoveryResult<T> = Result<T, RecoveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_unavailable_display() {
        let err = RecoveryError::destination_unavailable(
            &Destination::bucket("restored", None),
            StoreError::Unavailable("access denied".into()),
        );
        let display = err.to_string();

        assert!(display.starts_with("[ERROR] REWIND_RECOVERY_DESTINATION_UNAVAILABLE"));
        assert!(display.contains("bucket:restored"));
        assert!(display.contains("access denied"));
    }

    #[test]
    fn test_cancelled_code() {
        let err = RecoveryError::cancelled(4);
        assert_eq!(err.code(), RecoveryErrorCode::Cancelled);
        assert!(err.message().contains('4'));
    }

    #[test]
    fn test_actions_failed_display() {
        let err = RecoveryError::actions_failed(2, 5);
        assert_eq!(err.code(), RecoveryErrorCode::ActionsFailed);
        assert_eq!(
            err.to_string(),
            "[ERROR] REWIND_RECOVERY_ACTIONS_FAILED: 2 of 5 object(s) failed to recover"
        );
    }
}
