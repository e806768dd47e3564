//! Observable events of a recovery run
//!
//! Events are explicit and typed; the string form is what appears in the
//! `event` field of a log line.

use std::fmt;

/// Observable events in a recovery run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Run lifecycle
    /// Run started
    RunBegin,
    /// Run finished, report written
    RunComplete,
    /// Run aborted
    RunFailed,
    /// Configuration passed validation
    ConfigValidated,

    // Resolution
    /// History scan started
    ResolveBegin,
    /// One listing page consumed
    ResolvePage,
    /// History scan finished
    ResolveComplete,
    /// Listing failed, run aborts
    ResolveFailed,

    // Classification
    /// Tier probes started
    ClassifyBegin,
    /// Tier probes finished
    ClassifyComplete,
    /// One tier probe failed
    ProbeFailed,

    // Recovery
    /// Destination provisioned
    DestinationReady,
    /// Destination cannot accept writes, run aborts
    DestinationUnavailable,
    /// One object copied
    CopyComplete,
    /// One copy failed
    CopyFailed,
    /// One thaw request accepted
    ThawRequested,
    /// One thaw request failed
    ThawFailed,
    /// Scheduling stopped on cancellation
    RecoveryCancelled,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::RunBegin => "RUN_BEGIN",
            Event::RunComplete => "RUN_COMPLETE",
            Event::RunFailed => "RUN_FAILED",
            Event::ConfigValidated => "CONFIG_VALIDATED",

            Event::ResolveBegin => "RESOLVE_BEGIN",
            Event::ResolvePage => "RESOLVE_PAGE",
            Event::ResolveComplete => "RESOLVE_COMPLETE",
            Event::ResolveFailed => "RESOLVE_FAILED",

            Event::ClassifyBegin => "CLASSIFY_BEGIN",
            Event::ClassifyComplete => "CLASSIFY_COMPLETE",
            Event::ProbeFailed => "PROBE_FAILED",

            Event::DestinationReady => "DESTINATION_READY",
            Event::DestinationUnavailable => "DESTINATION_UNAVAILABLE",
            Event::CopyComplete => "COPY_COMPLETE",
            Event::CopyFailed => "COPY_FAILED",
            Event::ThawRequested => "THAW_REQUESTED",
            Event::ThawFailed => "THAW_FAILED",
            Event::RecoveryCancelled => "RECOVERY_CANCELLED",
        }
    }

    /// Returns true if this event ends the run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Event::RunFailed | Event::ResolveFailed | Event::DestinationUnavailable
        )
    }

    /// Returns true if this event reports an isolated per-object failure
    pub fn is_object_failure(&self) -> bool {
        matches!(
            self,
            Event::ProbeFailed | Event::CopyFailed | Event::ThawFailed
        )
    }

    /// Returns true if this event is per-object detail
    pub fn is_per_object(&self) -> bool {
        matches!(
            self,
            Event::ResolvePage | Event::CopyComplete | Event::ThawRequested
        ) || self.is_object_failure()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
