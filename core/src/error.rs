//! Error types for the artisan request client.
//!
//! # Design
//! Transport failures (`Network`) and server rejections (`HttpStatus`) are
//! separate variants so callers can tell "the backend never answered" from
//! "the backend answered with an error". Every error surfaces unchanged to
//! the caller; nothing here retries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response: connection refused, DNS
    /// failure, timeout, or the body could not be read.
    #[error("network error: {0}")]
    Network(String),

    /// The server returned a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("invalid image source: {0}")]
    InvalidImageSource(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Status code for `HttpStatus` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        // The transport never calls `error_for_status`; statuses are read by
        // `RequestClient::parse`.
        ApiError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_helpers() {
        let err = ApiError::HttpStatus {
            status: 404,
            body: "missing".into(),
        };
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
        assert!(!err.is_network());

        let err = ApiError::Network("connection refused".into());
        assert_eq!(err.status(), None);
        assert!(err.is_network());
    }

    #[test]
    fn display_includes_status_and_body() {
        let err = ApiError::HttpStatus {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }
}
