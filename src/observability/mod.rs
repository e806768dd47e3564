//! Observability for recovery runs
//!
//! - Structured logging (JSON lines on stderr)
//! - Typed lifecycle events
//! - Run counters
//!
//! Observability is read-only: nothing here influences which objects are
//! resolved or recovered.
//!
//! ```ignore
//! use rewind::observability::{log_event, Event, MetricsRegistry};
//!
//! log_event(Event::RunBegin, &[("bucket", "data")]);
//! let metrics = MetricsRegistry::new();
//! metrics.record_page(1000);
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::{ObservationScope, Timer};

/// Severity an event is logged at
pub fn severity_of(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Error
    } else if event.is_object_failure() {
        Severity::Warn
    } else if event.is_per_object() {
        Severity::Trace
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event with fields
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity_of(event), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping() {
        assert_eq!(severity_of(Event::ResolveFailed), Severity::Error);
        assert_eq!(severity_of(Event::CopyFailed), Severity::Warn);
        assert_eq!(severity_of(Event::CopyComplete), Severity::Trace);
        assert_eq!(severity_of(Event::RunBegin), Severity::Info);
    }

    #[test]
    fn test_log_event() {
        log_event(Event::RunBegin, &[]);
        log_event(Event::ConfigValidated, &[("bucket", "data")]);
    }
}
