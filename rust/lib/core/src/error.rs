use thiserror::Error;

// ── Error codes ─────────────────────────────────────────────────────

/// Machine-readable codes. Callers branch on these, not on messages.
pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const DECODE_ERROR: &str = "DECODE_ERROR";
    pub const INTERNAL: &str = "INTERNAL";
}

// ── ServiceError ────────────────────────────────────────────────────

/// Unified error returned by every backend collaborator.
///
/// Each variant maps to a stable error code (see [`error_code`]). The
/// `Display` output is only the message, so it can be shown in a toast
/// as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Resource does not exist. HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate key / concurrent modification. HTTP 409.
    #[error("{0}")]
    Conflict(String),

    /// Request rejected as invalid. HTTP 400 / 422.
    #[error("{0}")]
    Validation(String),

    /// Missing or expired credentials. HTTP 401.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed. HTTP 403.
    #[error("{0}")]
    PermissionDenied(String),

    /// Transport failure before a response was received.
    #[error("{0}")]
    Network(String),

    /// Response body did not have the expected shape.
    #[error("{0}")]
    Decode(String),

    /// Anything else, including 5xx responses.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => error_code::NOT_FOUND,
            ServiceError::Conflict(_) => error_code::ALREADY_EXISTS,
            ServiceError::Validation(_) => error_code::VALIDATION_FAILED,
            ServiceError::Unauthorized(_) => error_code::UNAUTHENTICATED,
            ServiceError::PermissionDenied(_) => error_code::PERMISSION_DENIED,
            ServiceError::Network(_) => error_code::NETWORK_ERROR,
            ServiceError::Decode(_) => error_code::DECODE_ERROR,
            ServiceError::Internal(_) => error_code::INTERNAL,
        }
    }

    /// Map a non-success HTTP status and its body to an error.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 | 422 => ServiceError::Validation(message),
            401 => ServiceError::Unauthorized(message),
            403 => ServiceError::PermissionDenied(message),
            404 => ServiceError::NotFound(message),
            409 => ServiceError::Conflict(message),
            _ => ServiceError::Internal(format!("HTTP {}: {}", status, message)),
        }
    }
}
