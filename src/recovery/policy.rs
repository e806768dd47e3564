//! What a run is allowed to do

use crate::store::ThawOptions;

/// Which partitions to act on, and how to thaw cold ones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPolicy {
    /// Copy readable objects to the destination
    pub recover_standard: bool,
    /// Send thaw requests for frozen objects
    pub recover_cold: bool,
    pub thaw: ThawOptions,
}

impl RecoveryPolicy {
    /// Act on both partitions
    pub fn all(thaw: ThawOptions) -> Self {
        Self {
            recover_standard: true,
            recover_cold: true,
            thaw,
        }
    }

    /// Act on nothing; used for dry runs
    pub fn none(thaw: ThawOptions) -> Self {
        Self {
            recover_standard: false,
            recover_cold: false,
            thaw,
        }
    }
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self::all(ThawOptions::default())
    }
}
