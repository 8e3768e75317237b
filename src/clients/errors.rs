//! HTTP-specific error types.
//!
//! A response with any status is not an error at this layer: the flow and
//! the proxy decide what a non-2xx status means. [`HttpError`] only covers
//! requests that never produced a response.

use thiserror::Error;

/// Failure of an outbound request to the platform.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Connection, TLS, timeout or body-read failure.
    #[error("Network error: {message}")]
    Transport {
        /// Transport diagnostic.
        message: String,
    },
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        // Strip the URL: it may carry an overridden host or query
        Self::Transport {
            message: err.without_url().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_message() {
        let error = HttpError::Transport {
            message: "connection refused".to_string(),
        };
        assert_eq!(error.to_string(), "Network error: connection refused");
    }

    #[test]
    fn test_http_error_implements_std_error() {
        let error = HttpError::Transport {
            message: "timeout".to_string(),
        };
        let _: &dyn std::error::Error = &error;
    }
}
