//! Recovery point and resolved objects

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::store::{StorageTier, VersionEvent};

/// The instant a bucket is rewound to
///
/// An event is visible at the recovery point iff
/// `event.last_modified <= point`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecoveryPoint(DateTime<Utc>);

impl RecoveryPoint {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }

    /// The current instant
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }

    /// True if something timestamped `at` had happened by this point
    pub fn includes(&self, at: DateTime<Utc>) -> bool {
        at <= self.0
    }
}

impl fmt::Display for RecoveryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

/// The single version of a key that was live at the recovery point
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedObject {
    pub key: String,
    pub version_id: String,
    pub last_modified: DateTime<Utc>,
    pub tier: StorageTier,
}

impl From<VersionEvent> for ResolvedObject {
    fn from(event: VersionEvent) -> Self {
        Self {
            key: event.key,
            version_id: event.version_id,
            last_modified: event.last_modified,
            tier: event.storage_tier,
        }
    }
}

/// Resolution result: at most one object per key, ordered by key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSet {
    objects: BTreeMap<String, ResolvedObject>,
}

impl ResolvedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object, replacing any previous object for the same key
    pub fn insert(&mut self, object: ResolvedObject) -> Option<ResolvedObject> {
        self.objects.insert(object.key.clone(), object)
    }

    pub fn get(&self, key: &str) -> Option<&ResolvedObject> {
        self.objects.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedObject> {
        self.objects.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }
}

impl IntoIterator for ResolvedSet {
    type Item = ResolvedObject;
    type IntoIter = std::collections::btree_map::IntoValues<String, ResolvedObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.into_values()
    }
}

impl FromIterator<ResolvedObject> for ResolvedSet {
    fn from_iter<I: IntoIterator<Item = ResolvedObject>>(iter: I) -> Self {
        let mut set = ResolvedSet::new();
        for object in iter {
            set.insert(object);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_point_includes_boundary() {
        let point = RecoveryPoint::at(at(2024, 1, 1));
        assert!(point.includes(at(2023, 12, 31)));
        assert!(point.includes(at(2024, 1, 1)));
        assert!(!point.includes(at(2024, 1, 2)));
    }

    #[test]
    fn test_point_display_rfc3339() {
        assert_eq!(RecoveryPoint::at(at(2024, 1, 1)).to_string(), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_set_one_object_per_key() {
        let mut set = ResolvedSet::new();
        let first = ResolvedObject {
            key: "a".into(),
            version_id: "v1".into(),
            last_modified: at(2024, 1, 1),
            tier: StorageTier::Standard,
        };
        let second = ResolvedObject {
            version_id: "v2".into(),
            ..first.clone()
        };

        assert!(set.insert(first).is_none());
        assert!(set.insert(second).is_some());
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("a").unwrap().version_id, "v2");
    }

    #[test]
    fn test_from_event() {
        let event = VersionEvent::version("k", "v", at(2024, 1, 1), StorageTier::Cold);
        let object = ResolvedObject::from(event);
        assert_eq!(object.tier, StorageTier::Cold);
        assert_eq!(object.version_id, "v");
    }
}
