//! Client error types.

use restline_tasks::TaskError;
use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors returned to callers.
///
/// Failures of individual attempts are not reported here; they are captured
/// as [`TransportError`]s on the attempt's result.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A configured value names a mode or rule that cannot be honored.
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// The operation is intentionally not available.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// The response body could not be decoded into the requested entity.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// The request entity could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The endpoint could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// URL parsing error.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The default transport could not be constructed.
    #[error("Failed to build transport: {0}")]
    TransportSetup(String),

    /// Background work was requested outside a tokio runtime.
    #[error("No async runtime: {0}")]
    Runtime(String),

    /// The recurring task could not be scheduled.
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single physical attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The attempt timed out.
    #[error("Request timed out")]
    Timeout,

    /// The connection could not be established or was dropped.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server answered with an error status.
    #[error("Response error: {status} - {description}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Status description.
        description: String,
    },

    /// The request could not be built or sent.
    #[error("Failed to send request: {0}")]
    Request(String),

    /// The response body could not be read.
    #[error("Failed to read response body: {0}")]
    Body(String),
}

impl TransportError {
    /// Check if this error is usually worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Connection(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429 || *status == 408,
            _ => false,
        }
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Check if this is a connection error.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Get the HTTP status code if this is a response error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connection(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status {
                status: status.as_u16(),
                description: status.canonical_reason().unwrap_or_default().to_string(),
            }
        } else if e.is_body() || e.is_decode() {
            Self::Body(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}
