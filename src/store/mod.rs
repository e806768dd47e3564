//! # Version Store
//!
//! Access to a versioned bucket: paginated version history, tier probes,
//! copies and thaw requests. The recovery core depends only on the traits in
//! `backend`; `LocalVersionStore` and `MemoryVersionStore` implement them.

pub mod errors;
pub mod event;
pub mod target;
pub mod backend;
pub mod local;
pub mod memory;

pub use errors::{StoreError, StoreResult};
pub use event::{Cursor, EventPage, StorageTier, TierStatus, VersionEvent, MAX_PAGE_SIZE};
pub use target::{Destination, ThawOptions, ThawTier, UnknownThawTier, DEFAULT_RETENTION_DAYS};
pub use backend::{EventSource, RecoverySink, TierProbe, VersionStore};
pub use local::LocalVersionStore;
pub use memory::{MemoryVersionStore, StoreCall};
