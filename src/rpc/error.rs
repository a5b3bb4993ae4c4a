//! Error types for JSON-RPC calls.

use thiserror::Error;

/// Errors that can occur when talking to a JSON-RPC node.
#[derive(Debug, Error)]
pub enum RpcError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Node answered with a non-success HTTP status.
    #[error("Node returned HTTP status {0}")]
    Status(u16),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The node returned a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The requested block, transaction or receipt does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for RpcError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RpcError::Timeout
        } else if err.is_connect() {
            RpcError::Connection(err.to_string())
        } else if err.is_decode() {
            RpcError::Parse(err.to_string())
        } else {
            RpcError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::Parse(err.to_string())
    }
}
