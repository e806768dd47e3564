//! CLI argument definitions using clap
//!
//! rewind --bucket <name> (--destination-bucket <name> | --destination-dir <path>)
//!        [--prefix <p>] [--time <ts>] [--thaw-tier <tier>] [--thaw-days <n>]
//!        [--concurrency <n>] [--config <path>] [--yes] [--dry-run]

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use crate::config::ConfigOverrides;

/// Restore a versioned bucket to the state it had at a point in time
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "rewind")]
#[command(version, about, long_about = None)]
#[command(group(
    ArgGroup::new("destination")
        .args(["destination_bucket", "destination_dir"])
        .multiple(false)
))]
pub struct Cli {
    /// Source bucket to restore
    #[arg(short = 'b', long)]
    pub bucket: Option<String>,

    /// Copy recovered objects into this bucket
    #[arg(short = 'd', long)]
    pub destination_bucket: Option<String>,

    /// Write recovered objects under this directory
    #[arg(short = 'o', long)]
    pub destination_dir: Option<PathBuf>,

    /// Region used if the destination bucket has to be created
    #[arg(short = 'r', long)]
    pub destination_region: Option<String>,

    /// Only recover keys starting with this prefix
    #[arg(short = 'p', long)]
    pub prefix: Option<String>,

    /// Point in time to restore to (RFC 3339 or YYYY-MM-DD). Default: now
    #[arg(short = 't', long)]
    pub time: Option<String>,

    /// Thaw speed for cold objects: Expedited, Standard or Bulk. Default: Standard
    #[arg(short = 'T', long)]
    pub thaw_tier: Option<String>,

    /// Days a thawed copy stays readable. Default: 7
    #[arg(short = 'D', long, allow_negative_numbers = true)]
    pub thaw_days: Option<i64>,

    /// Maximum simultaneous store operations. Default: 50
    #[arg(short = 'c', long, allow_negative_numbers = true)]
    pub concurrency: Option<i64>,

    /// Listing page size (1-1000)
    #[arg(long)]
    pub page_size: Option<i64>,

    /// Root directory of the local store. Default: $REWIND_STORE_ROOT or .
    #[arg(long)]
    pub store_root: Option<PathBuf>,

    /// JSON configuration file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Do not copy objects in standard storage
    #[arg(long)]
    pub skip_standard: bool,

    /// Do not send thaw requests for objects in cold storage
    #[arg(long)]
    pub skip_cold: bool,

    /// Resolve and classify only; print the plan and change nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Minimum log level: trace, info, warn or error. Default: $REWIND_LOG or info
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Values to layer over the configuration file
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bucket: self.bucket.clone(),
            destination_bucket: self.destination_bucket.clone(),
            destination_region: self.destination_region.clone(),
            destination_dir: self.destination_dir.clone(),
            prefix: self.prefix.clone(),
            time: self.time.clone(),
            thaw_tier: self.thaw_tier.clone(),
            thaw_days: self.thaw_days,
            concurrency: self.concurrency,
            page_size: self.page_size,
            store_root: self.store_root.clone(),
        }
    }
}
