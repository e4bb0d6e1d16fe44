//! error
//!
//! Error taxonomy shared by every layer of the client.
//!
//! # Design
//!
//! The binding layer is the only place that turns an HTTP status into a
//! [`CmisError`]. Everything above it propagates these values unchanged,
//! except where a missing capability, link relation, or allowable action
//! lets the client refuse an operation locally with
//! [`CmisError::NotSupported`] before any request is made.
//!
//! Nothing is retried here. Retry policy belongs to the caller.
//!
//! # Status Mapping
//!
//! | Status | Error |
//! |--------|-------|
//! | 400 | `InvalidArgument` |
//! | 401, 403 | `PermissionDenied` |
//! | 404 | `ObjectNotFound` |
//! | 405 | `NotSupported` |
//! | 409 | `UpdateConflict` |
//! | 500, anything else | `Runtime` |

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CmisError>;

/// Errors surfaced by CMIS operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CmisError {
    /// Authentication failed or the principal lacks permission (401, 403).
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The server rejected a request argument (400), or the client
    /// refused an argument before sending it.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested object does not exist (404).
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// The operation is not available (405), or the repository lacks the
    /// capability, link relation, or allowable action it needs.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// The object changed since it was read (409, stale change token).
    #[error("update conflict: {0}")]
    UpdateConflict(String),

    /// Server failure (500), an unexpected status, or a response that
    /// does not follow the protocol.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// The HTTP exchange itself failed (DNS, TLS, socket, timeout).
    #[error("connection error: {0}")]
    Connection(String),
}

impl CmisError {
    /// Translate a non-success HTTP status into the taxonomy.
    ///
    /// The response body, when it is readable text, becomes the message.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let detail = String::from_utf8_lossy(body).trim().to_string();
        let message = if detail.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, truncate(&detail, 512))
        };

        match status {
            400 => CmisError::InvalidArgument(message),
            401 | 403 => CmisError::PermissionDenied(message),
            404 => CmisError::ObjectNotFound(message),
            405 => CmisError::NotSupported(message),
            409 => CmisError::UpdateConflict(message),
            500 => CmisError::Runtime(message),
            other => CmisError::Runtime(format!("unexpected status {}: {}", other, message)),
        }
    }

    /// Shorthand for a protocol-compliance failure.
    pub fn protocol(message: impl Into<String>) -> Self {
        CmisError::Runtime(message.into())
    }

    /// Shorthand for a locally synthesized refusal.
    pub fn not_supported(message: impl Into<String>) -> Self {
        CmisError::NotSupported(message.into())
    }

    /// Whether this error came from a missing feature rather than a failure.
    pub fn is_not_supported(&self) -> bool {
        matches!(self, CmisError::NotSupported(_))
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
