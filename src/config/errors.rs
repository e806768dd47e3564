//! Configuration validation errors
//!
//! Every ValidationError is detected before any store call is made. None
//! are retryable: the input must be fixed.

use std::fmt;

/// Validation error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorCode {
    /// Source bucket not given
    MissingSource,
    /// Neither a destination bucket nor a destination directory given
    MissingDestination,
    /// Bucket name fails naming rules
    InvalidBucketName,
    /// Unknown thaw tier name
    InvalidTier,
    /// Retention days not a positive integer
    InvalidRetention,
    /// Recovery point not parseable
    InvalidTimestamp,
    /// Concurrency not a positive integer
    InvalidConcurrency,
    /// Config file unreadable or malformed
    InvalidFile,
    /// Any other bad or conflicting argument
    InvalidArgument,
}

impl ConfigErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingSource => "REWIND_CONFIG_MISSING_SOURCE",
            Self::MissingDestination => "REWIND_CONFIG_MISSING_DESTINATION",
            Self::InvalidBucketName => "REWIND_CONFIG_INVALID_BUCKET_NAME",
            Self::InvalidTier => "REWIND_CONFIG_INVALID_TIER",
            Self::InvalidRetention => "REWIND_CONFIG_INVALID_RETENTION",
            Self::InvalidTimestamp => "REWIND_CONFIG_INVALID_TIMESTAMP",
            Self::InvalidConcurrency => "REWIND_CONFIG_INVALID_CONCURRENCY",
            Self::InvalidFile => "REWIND_CONFIG_INVALID_FILE",
            Self::InvalidArgument => "REWIND_CONFIG_INVALID_ARGUMENT",
        }
    }
}

impl fmt::Display for ConfigErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Malformed or missing configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    code: ConfigErrorCode,
    message: String,
}

impl ValidationError {
    pub fn new(code: ConfigErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn missing_source() -> Self {
        Self::new(ConfigErrorCode::MissingSource, "source bucket is required (--bucket)")
    }

    pub fn missing_destination() -> Self {
        Self::new(
            ConfigErrorCode::MissingDestination,
            "destination is required (--destination-bucket or --destination-dir)",
        )
    }

    pub fn invalid_bucket_name(name: &str) -> Self {
        Self::new(
            ConfigErrorCode::InvalidBucketName,
            format!(
                "invalid bucket name '{}': 3-63 lowercase letters, digits, dots or hyphens, starting and ending with a letter or digit",
                name
            ),
        )
    }

    pub fn invalid_tier(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorCode::InvalidTier, message)
    }

    pub fn invalid_retention(days: i64) -> Self {
        Self::new(
            ConfigErrorCode::InvalidRetention,
            format!("thaw days must be a positive integer, got {}", days),
        )
    }

    pub fn invalid_timestamp(value: &str) -> Self {
        Self::new(
            ConfigErrorCode::InvalidTimestamp,
            format!("cannot parse time '{}': expected RFC 3339 or YYYY-MM-DD", value),
        )
    }

    pub fn invalid_concurrency(value: i64) -> Self {
        Self::new(
            ConfigErrorCode::InvalidConcurrency,
            format!("concurrency must be a positive integer, got {}", value),
        )
    }

    pub fn invalid_file(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorCode::InvalidFile, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorCode::InvalidArgument, message)
    }

    pub fn code(&self) -> ConfigErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ConfigResult<T> = Result<T, ValidationError>;
