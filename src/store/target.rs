//! # Recovery Targets
//!
//! Where recovered content goes, and how cold content is thawed.

use std::fmt;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Destination of copy actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Destination {
    /// Server-side copy into another bucket
    Bucket {
        name: String,
        #[serde(default)]
        region: Option<String>,
    },
    /// Byte-stream transfer into a local directory
    Directory { path: PathBuf },
}

impl Destination {
    pub fn bucket(name: impl Into<String>, region: Option<String>) -> Self {
        Self::Bucket {
            name: name.into(),
            region,
        }
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::Directory { path: path.into() }
    }

    /// Region hint used when provisioning a bucket destination
    pub fn region_hint(&self) -> Option<&str> {
        match self {
            Destination::Bucket { region, .. } => region.as_deref(),
            Destination::Directory { .. } => None,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Bucket { name, .. } => write!(f, "bucket:{}", name),
            Destination::Directory { path } => write!(f, "dir:{}", path.display()),
        }
    }
}

/// Speed class of a thaw request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThawTier {
    Expedited,
    Standard,
    Bulk,
}

impl ThawTier {
    pub const ALL: [ThawTier; 3] = [ThawTier::Expedited, ThawTier::Standard, ThawTier::Bulk];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThawTier::Expedited => "Expedited",
            ThawTier::Standard => "Standard",
            ThawTier::Bulk => "Bulk",
        }
    }
}

impl Default for ThawTier {
    fn default() -> Self {
        Self::Standard
    }
}

impl fmt::Display for ThawTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown thaw tier name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownThawTier(pub String);

impl fmt::Display for UnknownThawTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown thaw tier '{}', must be one of Expedited, Standard, Bulk",
            self.0
        )
    }
}

impl std::error::Error for UnknownThawTier {}

impl FromStr for ThawTier {
    type Err = UnknownThawTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThawTier::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownThawTier(s.to_string()))
    }
}

/// Days a thawed copy stays readable
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

/// Parameters of a thaw request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThawOptions {
    pub tier: ThawTier,
    pub retention_days: NonZeroU32,
}

impl ThawOptions {
    pub fn new(tier: ThawTier, retention_days: NonZeroU32) -> Self {
        Self {
            tier,
            retention_days,
        }
    }
}

impl Default for ThawOptions {
    fn default() -> Self {
        Self {
            tier: ThawTier::Standard,
            retention_days: NonZeroU32::new(DEFAULT_RETENTION_DAYS).unwrap_or(NonZeroU32::MIN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thaw_tier_parse_case_insensitive() {
        assert_eq!("bulk".parse::<ThawTier>().unwrap(), ThawTier::Bulk);
        assert_eq!("EXPEDITED".parse::<ThawTier>().unwrap(), ThawTier::Expedited);
        assert_eq!("Standard".parse::<ThawTier>().unwrap(), ThawTier::Standard);
    }

    #[test]
    fn test_thaw_tier_parse_rejects_unknown() {
        let err = "glacial".parse::<ThawTier>().unwrap_err();
        assert!(err.to_string().contains("glacial"));
    }

    #[test]
    fn test_default_thaw_options() {
        let opts = ThawOptions::default();
        assert_eq!(opts.tier, ThawTier::Standard);
        assert_eq!(opts.retention_days.get(), 7);
    }

    #[test]
    fn test_destination_display_and_region() {
        let bucket = Destination::bucket("restored", Some("eu-west-1".into()));
        assert_eq!(bucket.to_string(), "bucket:restored");
        assert_eq!(bucket.region_hint(), Some("eu-west-1"));

        let dir = Destination::directory("/tmp/out");
        assert_eq!(dir.region_hint(), None);
        assert!(dir.to_string().starts_with("dir:"));
    }
}
