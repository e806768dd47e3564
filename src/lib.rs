//! rewind - point-in-time recovery for versioned buckets
//!
//! Reconstructs which version of every key was live at a chosen instant,
//! then copies readable versions to a destination and sends thaw requests
//! for versions in cold storage.
//!
//! - `store`: version store collaborator traits and implementations
//! - `resolver`: point-in-time resolution over paginated history
//! - `classifier`: effective tier of each resolved object
//! - `dispatch`: bounded worker budget and cancellation
//! - `recovery`: copy/thaw orchestration and outcomes
//! - `config`: run configuration and validation
//! - `observability`: structured logs, lifecycle events, counters
//! - `cli`: command-line surface

pub mod classifier;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod observability;
pub mod recovery;
pub mod resolver;
pub mod store;

pub use error::{RunError, RunResult};
