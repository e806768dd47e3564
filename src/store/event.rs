//! # Version History Records
//!
//! A `VersionEvent` is one historical fact about one key: either a content
//! version existed from `last_modified`, or the key was deleted at
//! `last_modified` (delete marker). Events are produced only by the store and
//! never mutated after they are observed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of events a store returns in one listing page
pub const MAX_PAGE_SIZE: usize = 1000;

/// Storage tier reported for a version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageTier {
    /// Immediately readable
    Standard,
    /// Requires a thaw request before the content becomes readable
    Cold,
}

impl StorageTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageTier::Standard => "standard",
            StorageTier::Cold => "cold",
        }
    }
}

impl Default for StorageTier {
    fn default() -> Self {
        Self::Standard
    }
}

impl fmt::Display for StorageTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One historical version or delete marker for a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEvent {
    pub key: String,
    pub version_id: String,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub storage_tier: StorageTier,
    #[serde(default)]
    pub is_delete_marker: bool,
}

impl VersionEvent {
    /// A content version
    pub fn version(
        key: impl Into<String>,
        version_id: impl Into<String>,
        last_modified: DateTime<Utc>,
        storage_tier: StorageTier,
    ) -> Self {
        Self {
            key: key.into(),
            version_id: version_id.into(),
            last_modified,
            storage_tier,
            is_delete_marker: false,
        }
    }

    /// A delete marker
    pub fn delete_marker(
        key: impl Into<String>,
        version_id: impl Into<String>,
        last_modified: DateTime<Utc>,
    ) -> Self {
        Self {
            key: key.into(),
            version_id: version_id.into(),
            last_modified,
            storage_tier: StorageTier::Standard,
            is_delete_marker: true,
        }
    }
}

/// Opaque continuation token handed back by a store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of a version listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPage {
    pub events: Vec<VersionEvent>,
    /// `None` when the listing is exhausted
    pub next_cursor: Option<Cursor>,
}

impl EventPage {
    /// Final page of a listing
    pub fn last(events: Vec<VersionEvent>) -> Self {
        Self {
            events,
            next_cursor: None,
        }
    }

    /// A page followed by more pages
    pub fn with_next(events: Vec<VersionEvent>, next: Cursor) -> Self {
        Self {
            events,
            next_cursor: Some(next),
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}

/// Result of a point lookup on a cold version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierStatus {
    /// True when the version is readable now, or a thaw is already in flight
    pub already_thawed_or_standard: bool,
}

impl TierStatus {
    pub fn readable() -> Self {
        Self {
            already_thawed_or_standard: true,
        }
    }

    pub fn frozen() -> Self {
        Self {
            already_thawed_or_standard: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_event_constructors() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let v = VersionEvent::version("logs/a", "v1", at, StorageTier::Cold);
        assert!(!v.is_delete_marker);
        assert_eq!(v.storage_tier, StorageTier::Cold);

        let d = VersionEvent::delete_marker("logs/a", "d1", at);
        assert!(d.is_delete_marker);
        assert_eq!(d.storage_tier, StorageTier::Standard);
    }

    #[test]
    fn test_event_serde_defaults() {
        let json = r#"{"key":"a","version_id":"v","last_modified":"2024-01-01T00:00:00Z"}"#;
        let event: VersionEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.storage_tier, StorageTier::Standard);
        assert!(!event.is_delete_marker);
    }

    #[test]
    fn test_tier_serde_lowercase() {
        assert_eq!(serde_json::to_string(&StorageTier::Cold).unwrap(), "\"cold\"");
    }

    #[test]
    fn test_page_continuation() {
        assert!(EventPage::last(vec![]).is_last());
        assert!(!EventPage::with_next(vec![], Cursor::new("10")).is_last());
    }
}
