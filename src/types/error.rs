//! Error types for Greenroom

use hyper::StatusCode;

/// Main error type for Greenroom operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Recording not active: {0}")]
    RecordingNotActive(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Store inconsistency: {0}")]
    Inconsistency(String),

    #[error("Credential generation failed: {0}")]
    Credential(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RecordingNotActive(_) => StatusCode::CONFLICT,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Inconsistency(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Credential(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Caller-facing message. Collaborator failures are logged in full where
    /// they are first observed; the text crossing the service boundary never
    /// carries raw upstream detail, and lookup failures never reveal whether
    /// a passphrase exists.
    pub fn client_message(&self) -> &str {
        match self {
            Self::BadRequest(msg) => msg,
            Self::Unauthorized(_) | Self::NotFound(_) => "invalid access",
            Self::RecordingNotActive(_) => "recording not active",
            Self::Upstream(_)
            | Self::Database(_)
            | Self::Inconsistency(_)
            | Self::Credential(_)
            | Self::Config(_)
            | Self::Internal(_) => "internal server error",
        }
    }

    /// Convert to status code and body tuple for HTTP response
    pub fn into_status_code_and_body(self) -> (StatusCode, String) {
        let status = self.status_code();
        let body = self.client_message().to_string();
        (status, body)
    }
}

// Implement From conversions for common error types

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for Error {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl From<mongodb::error::Error> for Error {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Unauthorized(format!("JWT error: {}", err))
    }
}

/// Result type alias for Greenroom operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::RecordingNotActive("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::Upstream("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_client_message_hides_detail() {
        // Upstream/internal detail must never reach the caller verbatim
        let err = Error::Upstream("connection refused to 10.0.0.5:443".into());
        assert_eq!(err.client_message(), "internal server error");

        let err = Error::NotFound("no channel for passphrase abc".into());
        assert_eq!(err.client_message(), "invalid access");

        // Bad input is surfaced verbatim
        let err = Error::BadRequest("passphrase cannot be empty".into());
        assert_eq!(err.client_message(), "passphrase cannot be empty");
    }
}
