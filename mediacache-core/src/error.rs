//! Error type shared by the cache, transport, and fetcher.

use reqwest::StatusCode;
use thiserror::Error;

/// Terminal failure of a single resolve.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// The transfer itself failed.
    #[error("Transfer failed for {url}: {message}")]
    Transfer {
        /// Requested URL.
        url: String,
        /// Transport-layer message.
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Status returned by the server.
        status: StatusCode,
        /// Requested URL.
        url: String,
    },

    /// The transfer succeeded with an empty body.
    #[error("Empty payload from {0}")]
    EmptyPayload(String),

    /// The body is not a decodable image.
    #[error("Payload from {url} is not a decodable image: {reason}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Decoder message, kept for logs only.
        reason: String,
    },

    /// Encoding or writing the cache file failed.
    #[error("Failed to persist {key}: {message}")]
    Persist {
        /// Cache key being written.
        key: String,
        /// Filesystem or encoder message.
        message: String,
    },

    /// The URL has no usable file name to key on.
    #[error("Cannot derive a cache key from {0}")]
    InvalidKey(String),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl FetchError {
    /// Message handed to a failure callback.
    ///
    /// Payload problems carry no message: the transfer itself succeeded, so
    /// there is no lower-layer error to report.
    pub fn failure_message(&self) -> Option<String> {
        match self {
            FetchError::EmptyPayload(_) | FetchError::Decode { .. } => None,
            FetchError::Transfer { message, .. }
            | FetchError::Persist { message, .. } => Some(message.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Result alias for cache operations.
pub type Result<T> = std::result::Result<T, FetchError>;
