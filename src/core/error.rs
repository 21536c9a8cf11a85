//! Error types for the sentinel-client library.
//!
//! This module provides structured, typed errors for all failure scenarios.
//! The library never panics; all errors are returned as `Result` values.

use thiserror::Error;

/// The main error type for backend API operations.
///
/// Errors from user-initiated calls (`login`, `add_website`, `start_scan`)
/// are returned synchronously to the caller. Errors discovered inside a
/// poll tick are poller-fatal: the affected website is merged to the
/// `Error` status and the failure is surfaced through the notification
/// sink instead.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Invalid credentials or an expired token.
    #[error("authentication failed: {reason}")]
    Auth {
        /// Human-readable reason for the authentication failure.
        reason: String,
    },

    /// Network failure or a non-2xx response without a structured body.
    #[error("request failed: {message}")]
    Request {
        /// Error message describing the failure.
        message: String,
    },

    /// The task or website no longer exists server-side.
    #[error("not found: {what}")]
    NotFound {
        /// Description of what was missing.
        what: String,
    },

    /// The backend rejected the operation with an error payload.
    #[error("backend error: {message}")]
    Backend {
        /// Message carried by the backend's error payload.
        message: String,
    },

    /// The client is misconfigured.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl ApiError {
    /// Creates an `Auth` error.
    pub fn auth(reason: impl Into<String>) -> Self {
        Self::Auth {
            reason: reason.into(),
        }
    }

    /// Creates a `Request` error.
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }

    /// Creates a `NotFound` error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Creates a `Backend` error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` if this error aborts the poll loop when observed on
    /// a tick.
    ///
    /// Every variant qualifies: a poll tick is never retried, so that an
    /// unreachable backend cannot keep a poller spinning forever.
    pub fn is_poller_fatal(&self) -> bool {
        true
    }

    /// Returns `true` if this error indicates the session is no longer
    /// valid and the user should log in again.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

/// A specialized `Result` type for backend API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::auth("invalid credentials");
        assert_eq!(err.to_string(), "authentication failed: invalid credentials");

        let err = ApiError::not_found("task t1");
        assert_eq!(err.to_string(), "not found: task t1");
    }

    #[test]
    fn test_every_tick_error_is_fatal() {
        for err in [
            ApiError::auth("expired"),
            ApiError::request("connection refused"),
            ApiError::not_found("task"),
            ApiError::backend("boom"),
            ApiError::configuration("bad base url"),
        ] {
            assert!(err.is_poller_fatal());
        }
    }

    #[test]
    fn test_is_auth() {
        assert!(ApiError::auth("expired").is_auth());
        assert!(!ApiError::request("timeout").is_auth());
    }
}
