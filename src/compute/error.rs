//! Error type for the remote compute surface.

use thiserror::Error;

/// Errors raised by compute clients.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ComputeError {
    /// The referenced resource does not exist on the remote side (HTTP 404).
    #[error("remote resource not found: {resource}")]
    NotFound {
        /// Resource reference that failed to resolve.
        resource: String,
    },
    /// Transport-level failure before a response was read; safe to retry.
    #[error("transport failure: {message}")]
    Transport {
        /// Underlying transport error.
        message: String,
    },
    /// The remote API rejected the request.
    #[error("remote API error (status {status}): {message}")]
    Api {
        /// HTTP status code of the rejection.
        status: u16,
        /// Response body or decode failure description.
        message: String,
    },
}

impl ComputeError {
    /// Returns true for failures that a poll loop may retry.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Returns true for remote 404 responses.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
