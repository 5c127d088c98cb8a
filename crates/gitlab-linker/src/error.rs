//! Error types for the linker service.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that reject an inbound webhook delivery.
///
/// Tracker failures never end up here; they are absorbed by the
/// [`Linker`](crate::linker::Linker).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkerError {
    /// Missing or unknown `X-Gitlab-Token`.
    #[error("Unauthorized webhook delivery")]
    Unauthorized,

    /// Payload is not a complete event of the kind it declares.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),
}

impl LinkerError {
    /// HTTP status reported to the webhook sender.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MalformedEvent(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Errors from tracker API calls.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Transport failure, timeout or undecodable response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Tracker answered with a non-success status.
    #[error("Tracker returned {status}: {body}")]
    UnexpectedStatus {
        /// Response status.
        status: reqwest::StatusCode,
        /// Response body, possibly empty.
        body: String,
    },

    /// Token cannot be used as a header value.
    #[error("Invalid tracker token")]
    InvalidToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            LinkerError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            LinkerError::MalformedEvent("missing commits".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_error_display() {
        let err = LinkerError::MalformedEvent("missing field `url`".to_string());
        assert_eq!(err.to_string(), "Malformed event: missing field `url`");
    }
}
