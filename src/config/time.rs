//! Recovery point parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::resolver::RecoveryPoint;

use super::errors::{ConfigResult, ValidationError};

/// Parse a recovery point
///
/// Accepts RFC 3339 with any offset, a naive `YYYY-MM-DDTHH:MM:SS` taken as
/// UTC, or a bare `YYYY-MM-DD` meaning midnight UTC.
pub fn parse_recovery_point(value: &str) -> ConfigResult<RecoveryPoint> {
    let trimmed = value.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(RecoveryPoint::at(at.with_timezone(&Utc)));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(RecoveryPoint::at(naive.and_utc()));
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| RecoveryPoint::at(naive.and_utc()))
        .ok_or_else(|| ValidationError::invalid_timestamp(value))
}
