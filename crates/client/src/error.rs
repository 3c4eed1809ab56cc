//! Error types for the Saleso client.

use thiserror::Error;

use crate::store::StoreError;

/// Why a credential refresh could not produce a new access token.
///
/// Cloneable because one refresh result is handed to every caller waiting
/// on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshFailure {
    /// No refresh token is stored.
    #[error("no refresh token stored")]
    MissingRefreshToken,

    /// The refresh endpoint answered with a non-success status.
    #[error("refresh rejected (HTTP {status})")]
    Rejected {
        /// HTTP status code.
        status: u16,
    },

    /// The refresh request did not complete.
    #[error("refresh request failed: {0}")]
    Transport(String),

    /// The refresh endpoint answered with an unexpected body.
    #[error("malformed refresh response: {0}")]
    Malformed(String),

    /// The new credentials could not be persisted.
    #[error("session storage failed: {0}")]
    Store(String),
}

/// Errors returned by the authenticated gateway and the typed API.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the response body.
        message: String,
    },

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend rejected the access token even after a refresh.
    #[error("unauthorized: access token rejected after refresh")]
    Unauthorized,

    /// The session could not be renewed; the user has to log in again.
    #[error("session expired: {0}")]
    SessionExpired(#[from] RefreshFailure),

    /// Failed to parse a response body.
    #[error("parse error: {0}")]
    Parse(String),

    /// Session storage failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The request path could not be turned into a URL.
    #[error("invalid request path '{0}'")]
    InvalidPath(String),

    /// Input rejected before any request was made.
    #[error("validation error: {0}")]
    Validation(String),
}

impl GatewayError {
    /// Whether the caller has to send the user back to the login entry point.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired(_))
    }

    /// HTTP status associated with the error, when there is one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            Self::Unauthorized => Some(401),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Error body shape used by the backend.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorBody {
    /// Human-readable message.
    pub message: String,
}

/// Extract a message from an error response body.
///
/// Uses the `message` field when the body is the backend's JSON error shape,
/// otherwise the raw body truncated to 200 characters.
#[must_use]
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body).map_or_else(
        |_| body.chars().take(200).collect(),
        |parsed| parsed.message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_display() {
        let err = GatewayError::Api {
            status: 422,
            message: "price is required".to_string(),
        };
        assert_eq!(err.to_string(), "API error (422): price is required");

        let err = GatewayError::SessionExpired(RefreshFailure::MissingRefreshToken);
        assert_eq!(err.to_string(), "session expired: no refresh token stored");
        assert!(err.is_session_expired());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(GatewayError::NotFound("x".into()).status(), Some(404));
        assert_eq!(GatewayError::Unauthorized.status(), Some(401));
        assert_eq!(GatewayError::Validation("x".into()).status(), None);
    }

    #[test]
    fn test_error_message_prefers_json_field() {
        assert_eq!(error_message(r#"{"message":"Product not found"}"#), "Product not found");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message(&"x".repeat(500)).len(), 200);
    }
}
