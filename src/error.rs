//! Error handling for the Starlink exporter.

use crate::dish::RequestKind;

/// A specialized `Result` type for exporter operations.
pub type Result<T> = std::result::Result<T, ExporterError>;

/// The main error type for the Starlink exporter.
#[derive(Debug, thiserror::Error)]
pub enum ExporterError {
    /// The dish endpoint could not be reached
    #[error("Failed to connect to dish at {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    /// A gRPC call returned an error status
    #[error("{request} request failed: {source}")]
    Request {
        request: RequestKind,
        #[source]
        source: tonic::Status,
    },

    /// A gRPC call did not complete in time
    #[error("{request} request timed out")]
    Timeout { request: RequestKind },

    /// The dish answered with a payload other than the one requested
    #[error("Unexpected response to {request} request: {detail}")]
    UnexpectedResponse { request: RequestKind, detail: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registration or encoding failed
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Web server error
    #[error("Web server error: {0}")]
    WebServer(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExporterError {
    /// Create a new connection error
    pub fn connect_error(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        Self::Connect {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a new unexpected-response error
    pub fn unexpected_response(request: RequestKind, detail: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            request,
            detail: detail.into(),
        }
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }

    /// Whether this error came from a single device call rather than setup.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Request { .. } | Self::Timeout { .. } | Self::UnexpectedResponse { .. }
        )
    }
}
