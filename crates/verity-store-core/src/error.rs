//! Error types for storage engine operations
//!
//! Validation failures (`EmptyKey`, `EmptyValue`) are local to the call and
//! never retried. `NotFound` is the normal answer for a key that was never
//! written. `Init` and `Write` wrap the underlying cause.

use std::path::PathBuf;

use thiserror::Error;

/// Values longer than this are truncated in error messages
const MAX_RENDERED_VALUE: usize = 64;

/// Storage engine error types with context for diagnosis
#[derive(Debug, Error)]
pub enum StoreError {
    /// Caller passed an empty logical key
    #[error("key can't be empty")]
    EmptyKey,

    /// Caller passed an empty value to `put`
    #[error("value can't be empty")]
    EmptyValue,

    /// No value stored under the key
    #[error("value for key {key} not found")]
    NotFound {
        /// Lossy rendering of the logical key
        key: String,
    },

    /// An environment could not be opened
    #[error("failed to open environment at {}: {source}", path.display())]
    Init {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// One of the write transactions in `put` failed
    #[error("can't insert item {key}:{value}: {source}")]
    Write {
        key: String,
        value: String,
        #[source]
        source: redb::Error,
    },

    /// A read transaction failed
    #[error("read failed: {0}")]
    Read(#[source] redb::Error),

    /// Operation attempted after `close`
    #[error("engine is closed")]
    Closed,

    /// Index entry points at a digest missing from the main table
    #[error("index entry {key} has no value in the main table")]
    DanglingIndex { key: String },

    /// Stored bytes are not valid UTF-8 where text was expected
    #[error("value for key {key} is not valid UTF-8")]
    Decode { key: String },

    /// Configuration rejected by `Config::validate`
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StoreError {
    pub(crate) fn not_found(key: &[u8]) -> Self {
        StoreError::NotFound { key: render(key) }
    }

    pub(crate) fn write(key: &[u8], value: &[u8], source: impl Into<redb::Error>) -> Self {
        let mut value_text = render(value);
        if value_text.len() > MAX_RENDERED_VALUE {
            let mut cut = MAX_RENDERED_VALUE;
            while !value_text.is_char_boundary(cut) {
                cut -= 1;
            }
            value_text.truncate(cut);
            value_text.push_str("...");
        }
        StoreError::Write {
            key: render(key),
            value: value_text,
            source: source.into(),
        }
    }

    pub(crate) fn read(source: impl Into<redb::Error>) -> Self {
        StoreError::Read(source.into())
    }

    pub(crate) fn init(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        StoreError::Init {
            path: path.into(),
            source: source.into(),
        }
    }

    /// True for the expected "key never written" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub(crate) fn render(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Result type alias for storage engine operations
pub type StoreResult<T> = Result<T, StoreError>;
