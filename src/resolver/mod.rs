//! # Point-in-Time Resolution
//!
//! Reconstructs which version of every key under a prefix was live at a
//! recovery point, from the bucket's raw version and delete-marker history.
//!
//! A key is live at `T` if its latest content version with
//! `last_modified <= T` is not superseded by a strictly later delete marker
//! that is also `<= T`. Resolution reads history only; it never writes.

mod accumulator;
mod errors;
mod point;
mod resolve;

pub use accumulator::HistoryAccumulator;
pub use errors::{ResolveError, ResolveErrorCode, ResolveResult};
pub use point::{RecoveryPoint, ResolvedObject, ResolvedSet};
pub use resolve::{resolve, resolve_observed};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryVersionStore, StorageTier, VersionEvent};
    use chrono::{DateTime, TimeZone, Utc};

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn target() -> RecoveryPoint {
        RecoveryPoint::at(day(2024, 1, 1))
    }

    fn history() -> Vec<VersionEvent> {
        vec![
            VersionEvent::version("logs/a", "a-dec", day(2023, 12, 1), StorageTier::Standard),
            VersionEvent::version("logs/a", "a-feb", day(2024, 2, 1), StorageTier::Standard),
            VersionEvent::version("logs/b", "b-oct", day(2023, 10, 1), StorageTier::Standard),
            VersionEvent::delete_marker("logs/b", "b-del", day(2023, 11, 1)),
            VersionEvent::version("logs/b", "b-mar", day(2024, 3, 1), StorageTier::Standard),
            VersionEvent::version("logs/c", "c-sep", day(2023, 9, 1), StorageTier::Cold),
            VersionEvent::version("data/x", "x-jun", day(2023, 6, 1), StorageTier::Standard),
        ]
    }

    // === Scenarios ===

    #[tokio::test]
    async fn test_later_version_excluded() {
        let store = MemoryVersionStore::from_events(history(), 1000);
        let set = resolve("logs/", target(), &store).await.unwrap();

        let a = set.get("logs/a").unwrap();
        assert_eq!(a.version_id, "a-dec");
        assert_eq!(a.last_modified, day(2023, 12, 1));
    }

    #[tokio::test]
    async fn test_deleted_then_recreated_after_point_absent() {
        let store = MemoryVersionStore::from_events(history(), 1000);
        let set = resolve("logs/", target(), &store).await.unwrap();

        assert!(!set.contains_key("logs/b"));
    }

    #[tokio::test]
    async fn test_prefix_scopes_result() {
        let store = MemoryVersionStore::from_events(history(), 1000);
        let set = resolve("logs/", target(), &store).await.unwrap();

        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["logs/a", "logs/c"]);
        assert_eq!(set.get("logs/c").unwrap().tier, StorageTier::Cold);
    }

    // === Pagination ===

    #[tokio::test]
    async fn test_page_split_does_not_change_result() {
        let whole = MemoryVersionStore::from_events(history(), 1000);
        let expected = resolve("", target(), &whole).await.unwrap();

        for page_size in 1..=history().len() {
            let store = MemoryVersionStore::from_events(history(), page_size);
            let set = resolve("", target(), &store).await.unwrap();
            assert_eq!(set, expected, "page size {}", page_size);
        }
    }

    #[tokio::test]
    async fn test_cross_page_order_does_not_change_result() {
        let mut reversed = history();
        reversed.reverse();

        let forward = MemoryVersionStore::from_events(history(), 2);
        let backward = MemoryVersionStore::from_events(reversed, 3);

        assert_eq!(
            resolve("", target(), &forward).await.unwrap(),
            resolve("", target(), &backward).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_at_most_one_object_per_key() {
        let store = MemoryVersionStore::from_events(history(), 2);
        let set = resolve("", target(), &store).await.unwrap();

        let keys: Vec<&str> = set.iter().map(|o| o.key.as_str()).collect();
        let mut deduped = keys.clone();
        deduped.dedup();
        assert_eq!(keys, deduped);
    }
}
