//! # Version Store Errors

use thiserror::Error;

/// Result type for version store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Version store errors
///
/// Timeouts, throttling and transport failures all surface as one of these;
/// the recovery core treats every variant as a failed call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    // Bucket errors
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    // Object errors
    #[error("Object not found: {key} (version {version_id})")]
    ObjectNotFound { key: String, version_id: String },

    #[error("Object is in cold storage and has not been restored: {key} (version {version_id})")]
    NotRestorable { key: String, version_id: String },

    // Validation errors
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    // Integrity errors
    #[error("Checksum mismatch for {0}")]
    ChecksumMismatch(String),

    #[error("Corrupt history record in {bucket} at line {line}: {reason}")]
    CorruptHistory {
        bucket: String,
        line: usize,
        reason: String,
    },

    // Transport errors
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    IoError(String),

    // Internal
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Short stable name for reports and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::BucketNotFound(_) => "bucket_not_found",
            StoreError::ObjectNotFound { .. } => "object_not_found",
            StoreError::NotRestorable { .. } => "not_restorable",
            StoreError::InvalidPath(_) => "invalid_path",
            StoreError::InvalidCursor(_) => "invalid_cursor",
            StoreError::ChecksumMismatch(_) => "checksum_mismatch",
            StoreError::CorruptHistory { .. } => "corrupt_history",
            StoreError::Unavailable(_) => "unavailable",
            StoreError::IoError(_) => "io_error",
            StoreError::Internal(_) => "internal",
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::IoError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(StoreError::BucketNotFound("b".into()).kind(), "bucket_not_found");
        assert_eq!(StoreError::Unavailable("down".into()).kind(), "unavailable");
        assert_eq!(
            StoreError::NotRestorable {
                key: "k".into(),
                version_id: "v".into()
            }
            .kind(),
            "not_restorable"
        );
    }

    #[test]
    fn test_display_includes_version() {
        let err = StoreError::ObjectNotFound {
            key: "logs/a".into(),
            version_id: "v1".into(),
        };
        let display = err.to_string();
        assert!(display.contains("logs/a"));
        assert!(display.contains("v1"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err: StoreError = io_err.into();
        assert!(matches!(err, StoreError::IoError(ref m) if m.contains("disk gone")));
    }
}
