//! Error types for the framework service client.

use thiserror::Error;

/// Framework service client error.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Missing or invalid connection parameters; raised before any network
    /// attempt
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level failure (connection, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-2xx status or a non-OK response code
    #[error("Request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    /// The response body could not be decoded or was missing expected fields
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
