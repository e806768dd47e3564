//! # Run Configuration
//!
//! A run is configured from an optional JSON file with command-line flags
//! layered on top. `RecoveryConfig::validate` turns the raw values into typed
//! `RunSettings` or a `ValidationError`, before any store call is made.
//!
//! ```json
//! {
//!   "bucket": "data",
//!   "destination_bucket": "data-restored",
//!   "prefix": "logs/",
//!   "time": "2024-01-01T00:00:00Z",
//!   "thaw_tier": "Bulk",
//!   "thaw_days": 3
//! }
//! ```

mod errors;
mod time;

pub use errors::{ConfigErrorCode, ConfigResult, ValidationError};
pub use time::parse_recovery_point;

use std::fs;
use std::num::{NonZeroU32, NonZeroUsize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dispatch::DEFAULT_CONCURRENCY;
use crate::resolver::RecoveryPoint;
use crate::store::{Destination, ThawOptions, ThawTier, DEFAULT_RETENTION_DAYS, MAX_PAGE_SIZE};

/// Environment variable naming the local store root
pub const STORE_ROOT_ENV: &str = "REWIND_STORE_ROOT";

const BUCKET_NAME_PATTERN: &str = r"^[a-z0-9][a-z0-9.\-]{1,61}[a-z0-9]$";

/// Raw run configuration, as read from a file or assembled from flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecoveryConfig {
    /// Source bucket (required)
    #[serde(default)]
    pub bucket: Option<String>,

    /// Destination bucket; exclusive with `destination_dir`
    #[serde(default)]
    pub destination_bucket: Option<String>,

    /// Region hint used when the destination bucket is provisioned
    #[serde(default)]
    pub destination_region: Option<String>,

    /// Destination directory; exclusive with `destination_bucket`
    #[serde(default)]
    pub destination_dir: Option<PathBuf>,

    #[serde(default)]
    pub prefix: String,

    /// Recovery point (default: now)
    #[serde(default)]
    pub time: Option<String>,

    #[serde(default = "default_thaw_tier")]
    pub thaw_tier: String,

    #[serde(default = "default_thaw_days")]
    pub thaw_days: i64,

    #[serde(default = "default_concurrency")]
    pub concurrency: i64,

    #[serde(default = "default_page_size")]
    pub page_size: i64,

    /// Root of the local store (default: `$REWIND_STORE_ROOT` or `.`)
    #[serde(default)]
    pub store_root: Option<PathBuf>,
}

fn default_thaw_tier() -> String {
    ThawTier::default().as_str().to_string()
}
fn default_thaw_days() -> i64 {
    i64::from(DEFAULT_RETENTION_DAYS)
}
fn default_concurrency() -> i64 {
    DEFAULT_CONCURRENCY as i64
}
fn default_page_size() -> i64 {
    MAX_PAGE_SIZE as i64
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            destination_bucket: None,
            destination_region: None,
            destination_dir: None,
            prefix: String::new(),
            time: None,
            thaw_tier: default_thaw_tier(),
            thaw_days: default_thaw_days(),
            concurrency: default_concurrency(),
            page_size: default_page_size(),
            store_root: None,
        }
    }
}

/// Values given on the command line; `None` leaves the file value alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub bucket: Option<String>,
    pub destination_bucket: Option<String>,
    pub destination_region: Option<String>,
    pub destination_dir: Option<PathBuf>,
    pub prefix: Option<String>,
    pub time: Option<String>,
    pub thaw_tier: Option<String>,
    pub thaw_days: Option<i64>,
    pub concurrency: Option<i64>,
    pub page_size: Option<i64>,
    pub store_root: Option<PathBuf>,
}

/// Validated, typed settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub bucket: String,
    pub destination: Destination,
    pub prefix: String,
    pub point: RecoveryPoint,
    pub thaw: ThawOptions,
    pub concurrency: NonZeroUsize,
    pub page_size: usize,
    pub store_root: PathBuf,
}

impl RecoveryConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ValidationError::invalid_file(format!("failed to read {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            ValidationError::invalid_file(format!("invalid config JSON in {}: {}", path.display(), e))
        })
    }

    /// Apply command-line values over this configuration
    ///
    /// Naming one kind of destination on the command line replaces a
    /// destination of the other kind from the file.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides {
            bucket,
            destination_bucket,
            destination_region,
            destination_dir,
            prefix,
            time,
            thaw_tier,
            thaw_days,
            concurrency,
            page_size,
            store_root,
        } = overrides;

        if destination_bucket.is_some() && destination_dir.is_none() {
            self.destination_dir = None;
        }
        if destination_dir.is_some() && destination_bucket.is_none() {
            self.destination_bucket = None;
        }

        override_opt(&mut self.bucket, bucket);
        override_opt(&mut self.destination_bucket, destination_bucket);
        override_opt(&mut self.destination_region, destination_region);
        override_opt(&mut self.destination_dir, destination_dir);
        override_opt(&mut self.time, time);
        override_opt(&mut self.store_root, store_root);
        override_val(&mut self.prefix, prefix);
        override_val(&mut self.thaw_tier, thaw_tier);
        override_val(&mut self.thaw_days, thaw_days);
        override_val(&mut self.concurrency, concurrency);
        override_val(&mut self.page_size, page_size);
    }

    /// Check every field and produce typed settings
    pub fn validate(&self) -> ConfigResult<RunSettings> {
        let bucket = match self.bucket.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(ValidationError::missing_source()),
        };
        validate_bucket_name(&bucket)?;

        let destination = self.destination()?;

        let tier: ThawTier = self
            .thaw_tier
            .parse()
            .map_err(|e: crate::store::UnknownThawTier| ValidationError::invalid_tier(e.to_string()))?;

        let retention_days = u32::try_from(self.thaw_days)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(|| ValidationError::invalid_retention(self.thaw_days))?;

        let point = match self.time.as_deref() {
            Some(value) if !value.trim().is_empty() => parse_recovery_point(value)?,
            _ => RecoveryPoint::now(),
        };

        let concurrency = usize::try_from(self.concurrency)
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| ValidationError::invalid_concurrency(self.concurrency))?;

        let page_size = usize::try_from(self.page_size)
            .ok()
            .filter(|n| (1..=MAX_PAGE_SIZE).contains(n))
            .ok_or_else(|| {
                ValidationError::invalid_argument(format!(
                    "page size must be between 1 and {}, got {}",
                    MAX_PAGE_SIZE, self.page_size
                ))
            })?;

        let store_root = self
            .store_root
            .clone()
            .or_else(|| std::env::var_os(STORE_ROOT_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(RunSettings {
            bucket,
            destination,
            prefix: self.prefix.clone(),
            point,
            thaw: ThawOptions::new(tier, retention_days),
            concurrency,
            page_size,
            store_root,
        })
    }

    fn destination(&self) -> ConfigResult<Destination> {
        let bucket = self
            .destination_bucket
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let dir = self
            .destination_dir
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty());

        match (bucket, dir) {
            (Some(_), Some(_)) => Err(ValidationError::invalid_argument(
                "destination bucket and destination directory are mutually exclusive",
            )),
            (Some(name), None) => {
                validate_bucket_name(name)?;
                if self.bucket.as_deref().map(str::trim) == Some(name) {
                    return Err(ValidationError::invalid_argument(
                        "destination bucket must differ from the source bucket",
                    ));
                }
                Ok(Destination::bucket(name, self.destination_region.clone()))
            }
            (None, Some(path)) => Ok(Destination::directory(path.clone())),
            (None, None) => Err(ValidationError::missing_destination()),
        }
    }
}

fn override_opt<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn override_val<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// Check a bucket name against the naming rules
pub fn validate_bucket_name(name: &str) -> ConfigResult<()> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

    let matches = PATTERN
        .get_or_init(|| Regex::new(BUCKET_NAME_PATTERN).ok())
        .as_ref()
        .map(|re| re.is_match(name))
        .unwrap_or(false);

    if matches && !name.contains("..") {
        Ok(())
    } else {
        Err(ValidationError::invalid_bucket_name(name))
    }
}
