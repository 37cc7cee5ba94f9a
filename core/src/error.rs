//! Error types for the planner API client.
//!
//! # Design
//! Each [`FailureKind`] maps to its own variant so callers can branch on
//! the category with a plain `match`. The raw body is kept on every HTTP
//! variant for debugging, and [`ApiError::status`] exposes the status code
//! uniformly.

use thiserror::Error;

use crate::failure::{Failure, FailureKind};
use crate::session::StorageError;

/// Errors returned by `PlannerApi` calls and `PlannerClient` parse methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server returned 401; the session has already been cleared.
    #[error("session expired (HTTP 401)")]
    Unauthorized { body: String },

    #[error("forbidden (HTTP 403)")]
    Forbidden { body: String },

    #[error("resource not found (HTTP 404)")]
    NotFound { body: String },

    #[error("server error (HTTP {status})")]
    Server { status: u16, body: String },

    /// A non-2xx response carrying a server-supplied `message`.
    #[error("HTTP {status}: {message}")]
    Application { status: u16, message: String },

    #[error("unexpected HTTP {status}: {body}")]
    Unexpected { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// Status code of the response that caused this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Server { status, .. }
            | ApiError::Application { status, .. }
            | ApiError::Unexpected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<Failure> for ApiError {
    fn from(failure: Failure) -> Self {
        let Failure {
            kind,
            status,
            message,
            body,
        } = failure;
        let status = status.unwrap_or_default();
        match kind {
            FailureKind::Transport => ApiError::Transport(message.unwrap_or_default()),
            FailureKind::Authentication => ApiError::Unauthorized { body },
            FailureKind::Authorization => ApiError::Forbidden { body },
            FailureKind::NotFound => ApiError::NotFound { body },
            FailureKind::Server => ApiError::Server { status, body },
            FailureKind::Application => ApiError::Application {
                status,
                message: message.unwrap_or_default(),
            },
            FailureKind::Unclassified => ApiError::Unexpected { status, body },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_survives_conversion() {
        let failure = Failure {
            kind: FailureKind::Server,
            status: Some(502),
            message: None,
            body: "bad gateway".to_string(),
        };
        let err = ApiError::from(failure);
        assert_eq!(err.status(), Some(502));
        assert!(matches!(err, ApiError::Server { status: 502, .. }));
    }

    #[test]
    fn application_failure_keeps_message() {
        let failure = Failure {
            kind: FailureKind::Application,
            status: Some(409),
            message: Some("duplicado".to_string()),
            body: r#"{"message":"duplicado"}"#.to_string(),
        };
        let err = ApiError::from(failure);
        assert_eq!(err.to_string(), "HTTP 409: duplicado");
    }
}
