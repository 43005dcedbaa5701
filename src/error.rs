//! Error types for the GoAffPro SDK

use thiserror::Error;

/// Error codes returned by SDK operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoaffproErrorCode {
    /// `init` has not been called yet (no public token)
    NotInitialized,
    /// Request could not be sent or the response could not be read
    NetworkError,
    /// The public token was rejected
    Unauthorized,
    /// The requested resource does not exist
    NotFound,
    /// The server rejected the request payload
    BadRequest,
    /// The server failed to handle the request
    ServerError,
    /// Persisted state could not be read or written
    StorageError,
    /// Caller-supplied input is invalid
    ValidationError,
}

impl std::fmt::Display for GoaffproErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::NetworkError => "NETWORK_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound => "NOT_FOUND",
            Self::BadRequest => "BAD_REQUEST",
            Self::ServerError => "SERVER_ERROR",
            Self::StorageError => "STORAGE_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
        };
        f.write_str(s)
    }
}

/// Error returned by SDK operations.
///
/// Nothing in the SDK panics on these; every failure is handed back as a value
/// so callers can decide whether to surface it.
#[derive(Error, Debug, Clone)]
#[error("{code}: {message}")]
pub struct GoaffproError {
    /// Machine-readable error code
    pub code: GoaffproErrorCode,
    /// Human-readable message
    pub message: String,
    /// HTTP status, when the error came from a server response
    pub status: Option<u16>,
}

impl GoaffproError {
    pub fn new(code: GoaffproErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(code: GoaffproErrorCode, message: impl Into<String>, status: u16) -> Self {
        Self {
            code,
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GoaffproErrorCode::NetworkError, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(GoaffproErrorCode::StorageError, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(GoaffproErrorCode::ValidationError, message)
    }

    /// Returned when tracking is attempted before `init`.
    pub fn not_initialized(method: &str) -> Self {
        Self::new(
            GoaffproErrorCode::NotInitialized,
            format!(
                "Goaffpro SDK is not initialized. Please init the SDK before calling {} method",
                method
            ),
        )
    }

    pub fn is_not_initialized(&self) -> bool {
        self.code == GoaffproErrorCode::NotInitialized
    }
}

impl From<serde_json::Error> for GoaffproError {
    fn from(e: serde_json::Error) -> Self {
        Self::network(format!("Invalid JSON response: {}", e))
    }
}

/// Map an HTTP status from the GoAffPro API to an error code.
pub fn map_status_to_error_code(status: u16) -> GoaffproErrorCode {
    match status {
        400 | 422 => GoaffproErrorCode::BadRequest,
        401 | 403 => GoaffproErrorCode::Unauthorized,
        404 => GoaffproErrorCode::NotFound,
        500..=599 => GoaffproErrorCode::ServerError,
        _ => GoaffproErrorCode::NetworkError,
    }
}

pub type Result<T> = std::result::Result<T, GoaffproError>;
