//! HTTP request error types.

use thiserror::Error;

/// Result type for HTTP request operations.
pub type Result<T> = std::result::Result<T, HttpClientError>;

/// HTTP request errors.
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// The method string matched none of the supported methods.
    #[error("Unknown HTTP method: {0}")]
    UnknownMethod(String),

    /// The media type string could not be parsed.
    #[error("Invalid media type: {0}")]
    InvalidMediaType(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A header name or value was rejected.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The transport client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// Asynchronous scheduling was requested outside of a Tokio runtime.
    #[error("No Tokio runtime available to schedule the request")]
    NoRuntime,

    /// A blocking call was made on a current-thread Tokio runtime.
    #[error("Cannot block on a current-thread Tokio runtime; use execute_async")]
    BlockingInRuntime,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Underlying HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl HttpClientError {
    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// Check if this is a connection error.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_connect())
    }

    /// Check if the error happened before anything was sent.
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::UnknownMethod(_)
                | Self::InvalidMediaType(_)
                | Self::InvalidUrl(_)
                | Self::InvalidHeader(_)
        )
    }

    /// Get the HTTP status code carried by the transport error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
