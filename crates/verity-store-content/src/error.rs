//! Error types for content store writes
//!
//! Reads never fail: a missing, unreadable or tampered document is reported
//! as absence. Only `store` and friends return these.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    /// A document with this identifier was already written
    #[error("content {identifier} already exists")]
    AlreadyExists { identifier: String },

    /// Names go into a single header line
    #[error("invalid document name {name:?}: must not contain a newline")]
    InvalidName { name: String },

    /// Caller-supplied checksum does not match the document bytes
    #[error("checksum mismatch: expected {expected}, computed {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("I/O error in {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ContentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ContentError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for content store operations
pub type ContentResult<T> = Result<T, ContentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ContentError::ChecksumMismatch {
            expected: "aa".into(),
            actual: "bb".into(),
        };
        assert_eq!(err.to_string(), "checksum mismatch: expected aa, computed bb");

        let err = ContentError::InvalidName { name: "a\nb".into() };
        assert!(err.to_string().contains("newline"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ContentError::io("/store/abc", io);
        assert!(err.to_string().contains("/store/abc"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
