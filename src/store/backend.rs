//! # Version Store Traits
//!
//! The recovery core talks to a versioned bucket only through these traits.
//! A store instance is bound to one source bucket. Every method is a network
//! (or disk) round trip and may suspend the calling task.

use async_trait::async_trait;

use super::errors::StoreResult;
use super::event::{Cursor, EventPage, TierStatus};
use super::target::{Destination, ThawOptions};

/// Paginated access to version and delete-marker history
#[async_trait]
pub trait EventSource: Send + Sync {
    /// List up to `MAX_PAGE_SIZE` events under `prefix`, starting at `cursor`
    /// (`None` for the first page). Events are in no particular order.
    async fn list_version_events(
        &self,
        prefix: &str,
        cursor: Option<&Cursor>,
    ) -> StoreResult<EventPage>;
}

/// Point lookup of a version's restore state
#[async_trait]
pub trait TierProbe: Send + Sync {
    async fn probe_tier(&self, key: &str, version_id: &str) -> StoreResult<TierStatus>;
}

/// Tier-aware recovery primitives
#[async_trait]
pub trait RecoverySink: Send + Sync {
    /// Idempotently provision the destination
    async fn ensure_destination(&self, destination: &Destination) -> StoreResult<()>;

    /// Copy one exact version into the destination
    async fn fetch_or_copy(
        &self,
        key: &str,
        version_id: &str,
        destination: &Destination,
    ) -> StoreResult<()>;

    /// Submit a thaw request for one exact cold version
    async fn request_thaw(
        &self,
        key: &str,
        version_id: &str,
        options: ThawOptions,
    ) -> StoreResult<()>;
}

/// Everything a recovery run needs from the store
pub trait VersionStore: EventSource + TierProbe + RecoverySink {}

impl<T: EventSource + TierProbe + RecoverySink + ?Sized> VersionStore for T {}
