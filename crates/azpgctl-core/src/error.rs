//! Unified error handling for azpgctl-core
//!
//! Every control-plane call returns a single [`Result`]; the variants below
//! separate failures that happen before a request is sent (configuration,
//! validation) from transport failures and remote rejections.
//!
//! # Example
//!
//! ```rust
//! use azpgctl_core::CoreError;
//!
//! let err = CoreError::Remote { status: 404, body: "{}".to_string() };
//! assert!(err.is_not_found());
//! assert!(!err.is_unauthorized());
//! ```

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;

/// Core error type for control-plane operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// Missing or unreadable configuration / credentials
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Request rejected client-side before any network call
    #[error("Validation error on '{field}': {message}")]
    Validation { field: String, message: String },

    /// Network-level failure (DNS, connect, timeout, reset)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status returned by the service
    #[error("Remote error (HTTP {status}): {body}")]
    Remote { status: u16, body: String },

    /// The addressed resource does not exist
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Credentials were rejected (401/403)
    #[error("Unauthorized (HTTP {status}): {body}")]
    Unauthorized { status: u16, body: String },

    /// An accepted long-running operation finished in a failure state
    #[error("Operation finished with status '{status}': {body}")]
    OperationFailed { status: String, body: String },

    /// Long-running operation did not reach a terminal state in time
    #[error("Operation timed out after {0:?}")]
    PollTimeout(Duration),

    /// Caller cancelled the request or the polling loop
    #[error("Operation cancelled")]
    Cancelled,

    /// Token acquisition failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        CoreError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// HTTP status carried by this error, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            CoreError::Remote { status, .. } | CoreError::Unauthorized { status, .. } => {
                Some(*status)
            }
            CoreError::NotFound { .. } => Some(404),
            CoreError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. }) || self.status() == Some(404)
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        match self {
            CoreError::Unauthorized { .. } | CoreError::Auth(_) => true,
            _ => matches!(self.status(), Some(401 | 403)),
        }
    }

    /// Returns true if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(500..=599))
    }

    /// Returns true if this is a timeout error
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            CoreError::PollTimeout(_) => true,
            CoreError::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns true if this is a bad request error (400 or client-side validation)
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        matches!(self, CoreError::Validation { .. }) || self.status() == Some(400)
    }
}
