//! Resolver error types
//!
//! Resolution is all-or-nothing: any failure discards everything
//! accumulated so far and aborts the run.

use std::fmt;

use crate::store::StoreError;

/// Resolver error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveErrorCode {
    /// The event source failed mid-scan
    SourceUnavailable,
    /// The run was cancelled between two page fetches
    Cancelled,
}

impl ResolveErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolveErrorCode::SourceUnavailable => "REWIND_RESOLVE_SOURCE_UNAVAILABLE",
            ResolveErrorCode::Cancelled => "REWIND_RESOLVE_CANCELLED",
        }
    }
}

impl fmt::Display for ResolveErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolver error with context
#[derive(Debug)]
pub struct ResolveError {
    code: ResolveErrorCode,
    message: String,
    /// Pages consumed before the failure
    pages_read: u64,
    source: Option<StoreError>,
}

impl ResolveError {
    /// Listing failed after `pages_read` successful pages
    pub fn source_unavailable(pages_read: u64, source: StoreError) -> Self {
        Self {
            code: ResolveErrorCode::SourceUnavailable,
            message: format!("version listing failed after {} page(s)", pages_read),
            pages_read,
            source: Some(source),
        }
    }

    /// The source handed back a cursor that does not advance the listing
    pub fn stalled_cursor(pages_read: u64, cursor: &str) -> Self {
        Self {
            code: ResolveErrorCode::SourceUnavailable,
            message: format!(
                "version listing returned cursor '{}' twice after {} page(s)",
                cursor, pages_read
            ),
            pages_read,
            source: None,
        }
    }

    pub fn cancelled(pages_read: u64) -> Self {
        Self {
            code: ResolveErrorCode::Cancelled,
            message: format!("resolution cancelled after {} page(s)", pages_read),
            pages_read,
            source: None,
        }
    }

    pub fn code(&self) -> ResolveErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn pages_read(&self) -> u64 {
        self.pages_read
    }

    pub fn store_error(&self) -> Option<&StoreError> {
        self.source.as_ref()
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code, self.message)?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for resolution
pub type ResolveResult<T> = Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ResolveErrorCode::SourceUnavailable.as_str(),
            "REWIND_RESOLVE_SOURCE_UNAVAILABLE"
        );
        assert_eq!(ResolveErrorCode::Cancelled.as_str(), "REWIND_RESOLVE_CANCELLED");
    }

    #[test]
    fn test_source_unavailable_display() {
        let err = ResolveError::source_unavailable(3, StoreError::Unavailable("throttled".into()));
        let display = err.to_string();

        assert!(display.contains("REWIND_RESOLVE_SOURCE_UNAVAILABLE"));
        assert!(display.contains("3 page(s)"));
        assert!(display.contains("throttled"));
        assert_eq!(err.pages_read(), 3);
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error;
        let err = ResolveError::source_unavailable(0, StoreError::IoError("eof".into()));
        assert!(err.source().is_some());
        assert!(ResolveError::cancelled(1).source().is_none());
    }
}
