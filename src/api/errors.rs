//! API error types
//!
//! API errors are pass-through: a storage failure keeps the storage code and
//! message, so the failure reason a client sees names the real cause.

use std::fmt;

use crate::storage::StoreError;

/// API-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// Arguments do not match the request schema
    UserdbInvalidRequest,
    /// Request name is not in the schema
    UserdbUnknownOperation,
    /// Schema rejected at construction
    UserdbSchemaInvalid,
}

impl ApiErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ApiErrorCode::UserdbInvalidRequest => "USERDB_INVALID_REQUEST",
            ApiErrorCode::UserdbUnknownOperation => "USERDB_UNKNOWN_OPERATION",
            ApiErrorCode::UserdbSchemaInvalid => "USERDB_SCHEMA_INVALID",
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// API error with preserved subsystem error information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    code: String,
    message: String,
}

impl ApiError {
    /// Create an invalid request error
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self {
            code: ApiErrorCode::UserdbInvalidRequest.code().to_string(),
            message: reason.into(),
        }
    }

    /// Create an unknown operation error
    pub fn unknown_operation(op: impl Into<String>) -> Self {
        Self {
            code: ApiErrorCode::UserdbUnknownOperation.code().to_string(),
            message: format!("Unknown operation: {}", op.into()),
        }
    }

    pub fn schema_invalid(reason: impl Into<String>) -> Self {
        Self {
            code: ApiErrorCode::UserdbSchemaInvalid.code().to_string(),
            message: reason.into(),
        }
    }

    /// Create from a storage error (pass-through)
    pub fn from_store_error(err: StoreError) -> Self {
        Self {
            code: err.code().code().to_string(),
            message: err.to_string(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::from_store_error(err)
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
