//! Route error types

use thiserror::Error;

/// Errors that can occur while fetching or reading a route document
#[derive(Debug, Error)]
pub enum RouteError {
    /// Connection to the routing service failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// HTTP request to the routing service failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The route document is not well-formed XML
    #[error("Malformed route document: {0}")]
    MalformedDocument(String),

    /// Reading the route document failed mid-stream
    #[error("I/O error while reading route document: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Request timeout
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout {
        /// The timeout duration in seconds
        timeout_secs: u64,
    },
}

impl RouteError {
    /// Returns true if this error is transient
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::RequestFailed(_) | Self::Io(_) | Self::Timeout { .. }
        )
    }
}

impl From<quick_xml::Error> for RouteError {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(io) => Self::Io(std::io::Error::new(io.kind(), io.to_string())),
            other => Self::MalformedDocument(other.to_string()),
        }
    }
}
