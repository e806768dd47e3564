//! Top-level run errors
//!
//! A run either fails validation (fix the input, exit 1) or fails while
//! talking to the store (infrastructure problem, exit 2). Per-object
//! failures are not run errors; they are reported in outcomes.

use thiserror::Error;

use crate::config::ValidationError;
use crate::recovery::RecoveryError;
use crate::resolver::ResolveError;
use crate::store::StoreError;

/// Exit code of a successful run
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code of a validation failure
pub const EXIT_VALIDATION: i32 = 1;
/// Exit code of an operational failure
pub const EXIT_OPERATIONAL: i32 = 2;

/// Failure after validation passed
#[derive(Debug, Error)]
pub enum OperationalError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Recovery(#[from] RecoveryError),

    #[error("[ERROR] REWIND_STORE_{}: {}", .0.kind().to_ascii_uppercase(), .0)]
    Store(#[from] StoreError),

    #[error("[ERROR] REWIND_IO_ERROR: {0}")]
    Io(String),
}

/// Why a run did not succeed
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Operational(#[from] OperationalError),
}

impl RunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Validation(_) => EXIT_VALIDATION,
            RunError::Operational(_) => EXIT_OPERATIONAL,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, RunError::Validation(_))
    }
}

impl From<ResolveError> for RunError {
    fn from(err: ResolveError) -> Self {
        RunError::Operational(err.into())
    }
}

impl From<RecoveryError> for RunError {
    fn from(err: RecoveryError) -> Self {
        RunError::Operational(err.into())
    }
}

impl From<StoreError> for RunError {
    fn from(err: StoreError) -> Self {
        RunError::Operational(err.into())
    }
}

impl From<std::io::Error> for RunError {
    fn from(err: std::io::Error) -> Self {
        RunError::Operational(OperationalError::Io(err.to_string()))
    }
}

pub type RunResult<T> = Result<T, RunError>;
