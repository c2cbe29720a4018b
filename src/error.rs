// Error handling module
// Defines the error surfaced by every API call

use reqwest::StatusCode;
use thiserror::Error;

/// Message carried by every connectivity failure
pub const CONNECT_FAILED_MESSAGE: &str = "Failed to connect to backend";

/// Fallback message when the error envelope carries an empty message
pub const REQUEST_FAILED_MESSAGE: &str = "Request failed";

/// Errors returned by the authenticated API client
#[derive(Error, Debug)]
pub enum ApiError {
    /// No usable HTTP response was obtained (transport failure, unreadable
    /// or undecodable body, or a request that could not be built)
    #[error("Failed to connect to backend")]
    Connectivity,

    /// Backend answered with a non-success status
    #[error("{message}")]
    Server {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Token store could not be read before sending
    #[error("Token store error: {0}")]
    Storage(#[source] anyhow::Error),
}

impl ApiError {
    /// Error for a JSON error envelope
    pub fn decoded(status: StatusCode, code: String, message: String) -> Self {
        let message = if message.is_empty() {
            REQUEST_FAILED_MESSAGE.to_string()
        } else {
            message
        };

        ApiError::Server {
            status: status.as_u16(),
            code: Some(code),
            message,
        }
    }

    /// Error for a non-success response without a decodable body
    pub fn undecoded(status: StatusCode) -> Self {
        ApiError::Server {
            status: status.as_u16(),
            code: None,
            message: format!("Request failed with status {}", status.as_u16()),
        }
    }

    /// HTTP status of the response, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the backend still rejected the credentials
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
