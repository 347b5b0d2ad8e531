//! Error types for the Dominus SDK

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Dominus SDK operations
#[derive(Error, Debug)]
pub enum Error {
    /// API error returned by the server
    #[error("API error ({status_code}): {code} - {message}")]
    Api {
        code: String,
        message: String,
        status_code: u16,
        validation_errors: Vec<ValidationIssue>,
    },

    /// Token refresh failed; the session has been cleared
    #[error("token refresh failed")]
    RefreshFailed {
        #[source]
        source: Box<Error>,
    },

    /// No usable credentials; the caller must re-authenticate
    #[error("authentication required: {0}")]
    LoginRequired(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Normalize an error response body into an [`Error::Api`].
    ///
    /// ABP-style backends wrap failures in `{"error": {code, message,
    /// validationErrors}}`; anything else is surfaced with the raw body as
    /// the message.
    pub(crate) fn from_response(status_code: u16, body: &[u8]) -> Self {
        if let Ok(envelope) = serde_json::from_slice::<RemoteServiceErrorEnvelope>(body) {
            let remote = envelope.error;
            return Error::Api {
                code: remote.code.unwrap_or_else(|| status_code.to_string()),
                message: remote
                    .message
                    .or(remote.details)
                    .unwrap_or_else(|| "an unexpected error occurred".to_string()),
                status_code,
                validation_errors: remote.validation_errors,
            };
        }

        Error::Api {
            code: status_code.to_string(),
            message: String::from_utf8_lossy(body).trim().to_string(),
            status_code,
            validation_errors: vec![],
        }
    }

    /// Returns true if this is a validation error (400)
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Api { status_code: 400, .. })
    }

    /// Returns true if this is an authentication error (401)
    pub fn is_authentication_error(&self) -> bool {
        matches!(self, Error::Api { status_code: 401, .. })
    }

    /// Returns true if this is an authorization error (403)
    pub fn is_authorization_error(&self) -> bool {
        matches!(self, Error::Api { status_code: 403, .. })
    }

    /// Returns true if this is a not found error (404)
    pub fn is_not_found_error(&self) -> bool {
        matches!(self, Error::Api { status_code: 404, .. })
    }

    /// Returns true if the server failed (5xx)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { status_code, .. } if *status_code >= 500)
    }

    /// Returns true if the session is gone and a new login is needed
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Error::RefreshFailed { .. }
                | Error::LoginRequired(_)
                | Error::Api {
                    status_code: 401,
                    ..
                }
        )
    }
}

/// One field-level problem from a validation failure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    #[serde(default)]
    pub members: Vec<String>,
    pub message: String,
}

/// ABP remote-service error envelope
#[derive(Debug, Deserialize)]
struct RemoteServiceErrorEnvelope {
    error: RemoteServiceError,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteServiceError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    validation_errors: Vec<ValidationIssue>,
}
