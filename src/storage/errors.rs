//! Storage error types
//!
//! Error codes:
//! - USERDB_STORE_READ_FAILED
//! - USERDB_STORE_WRITE_FAILED
//! - USERDB_STORE_SERIALIZE_FAILED
//!
//! A malformed document is deliberately NOT an error; see `DurableStore::load`.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Storage-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// Backing file exists but could not be read
    UserdbStoreReadFailed,
    /// Backing file could not be replaced
    UserdbStoreWriteFailed,
    /// Record set could not be encoded as JSON
    UserdbStoreSerializeFailed,
}

impl StoreErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCode::UserdbStoreReadFailed => "USERDB_STORE_READ_FAILED",
            StoreErrorCode::UserdbStoreWriteFailed => "USERDB_STORE_WRITE_FAILED",
            StoreErrorCode::UserdbStoreSerializeFailed => "USERDB_STORE_SERIALIZE_FAILED",
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Storage error with the offending path and the underlying cause
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize record set: {0}")]
    SerializeFailed(#[from] serde_json::Error),
}

impl StoreError {
    pub fn read_failed(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::ReadFailed {
            path: path.into(),
            source,
        }
    }

    pub fn write_failed(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::WriteFailed {
            path: path.into(),
            source,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> StoreErrorCode {
        match self {
            StoreError::ReadFailed { .. } => StoreErrorCode::UserdbStoreReadFailed,
            StoreError::WriteFailed { .. } => StoreErrorCode::UserdbStoreWriteFailed,
            StoreError::SerializeFailed(_) => StoreErrorCode::UserdbStoreSerializeFailed,
        }
    }
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
