//! Error types for the EasyTransfer client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the transfer server
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a usable response arrived
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Server answered with an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Longest response body excerpt kept in an error message
const MAX_ERROR_BODY: usize = 200;

impl ClientError {
    /// Create an API error from status code and response body
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        let mut message: String = message.into();
        if message.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !message.is_char_boundary(cut) {
                cut -= 1;
            }
            message.truncate(cut);
            message.push_str("...");
        }

        Self::ApiError { status, message }
    }

    /// Check if no bytes were received from the server
    ///
    /// Connection, DNS, timeout and body read failures are transport errors;
    /// anything the server actually answered is not.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::RequestFailed(_))
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if the server rejected the token
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::ApiError { status: 401 | 403, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_truncates_long_bodies() {
        let err = ClientError::api_error(502, "x".repeat(1000));
        match err {
            ClientError::ApiError { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message.len(), MAX_ERROR_BODY + 3);
            }
            _ => panic!("expected ApiError"),
        }
    }

    #[test]
    fn test_error_classification() {
        assert!(ClientError::api_error(404, "").is_not_found());
        assert!(ClientError::api_error(401, "").is_unauthorized());
        assert!(!ClientError::api_error(500, "").is_transport());
        assert!(!ClientError::ParseError("bad".to_string()).is_transport());
    }
}
