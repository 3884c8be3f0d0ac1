use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("API returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout(_) => true,
            ApiError::HttpStatus { status, .. } => *status >= 500,
            ApiError::Decode(_) | ApiError::Config(_) => false,
        }
    }
}

#[cfg(feature = "client")]
impl ApiError {
    /// Translates a transport failure, keeping timeouts distinct.
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(timeout)
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_failures_are_retryable() {
        assert!(ApiError::Network("reset".into()).is_retryable());
        assert!(ApiError::Timeout(Duration::from_secs(5)).is_retryable());
        assert!(
            ApiError::HttpStatus {
                status: 503,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !ApiError::HttpStatus {
                status: 422,
                body: "invalid".into()
            }
            .is_retryable()
        );
        assert!(!ApiError::Decode("eof".into()).is_retryable());
    }

    #[test]
    fn timeout_message_reports_the_bound() {
        let err = ApiError::Timeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "Request timed out after 5000ms");
    }
}
