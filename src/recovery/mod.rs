//! # Tiered Recovery
//!
//! Acts on a classified set: copies readable versions to the destination and
//! sends thaw requests for frozen ones. A thaw only starts the restore; the
//! object is copied by a later run once the provider has finished.
//!
//! Nothing here retries. A failed call is reported once, in its outcome.

mod errors;
mod orchestrator;
mod outcome;
mod policy;

pub use errors::{RecoveryError, RecoveryErrorCode, RecoveryResult};
pub use orchestrator::Orchestrator;
pub use outcome::{ErrorDetail, RecoveryAction, RecoveryOutcome, RecoveryReport};
pub use policy::RecoveryPolicy;
