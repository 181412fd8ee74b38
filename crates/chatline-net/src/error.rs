//! Error types for the networking module.

/// Network-specific errors.
///
/// The realtime channel reports [`ConnectionTimeout`](Self::ConnectionTimeout),
/// [`Transport`](Self::Transport) and
/// [`MaxReconnectAttemptsExceeded`](Self::MaxReconnectAttemptsExceeded) through
/// its error observer. [`Decode`](Self::Decode) never reaches an observer; bad
/// frames are logged and dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// HTTP request failed.
    #[error("HTTP request error: {0}")]
    Request(String),
    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// HTTP request timed out.
    #[error("Request timed out")]
    Timeout,
    /// The transport did not open within the configured connect timeout.
    #[error("Connection timed out after {}ms", .0.as_millis())]
    ConnectionTimeout(std::time::Duration),
    /// Connection refused or failed.
    #[error("Connection error: {0}")]
    Connection(String),
    /// Low-level WebSocket transport failure, before or after open.
    #[error("Transport error: {0}")]
    Transport(String),
    /// The reconnection policy gave up.
    #[error("Max reconnection attempts ({attempts}) reached")]
    MaxReconnectAttemptsExceeded {
        /// Number of attempts made before giving up.
        attempts: u32,
    },
    /// An inbound frame could not be decoded.
    #[error("Frame decode error: {0}")]
    Decode(String),
    /// The operation requires an open connection.
    #[error("Not connected")]
    NotConnected,
    /// Invalid header name or value.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),
    /// HTTP error status (4xx or 5xx).
    #[error("HTTP {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// Optional error message from the response body.
        message: Option<String>,
    },
}

impl NetworkError {
    /// Returns `true` for errors that end the automatic reconnection cycle.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout(_) | Self::MaxReconnectAttemptsExceeded { .. }
        )
    }

    /// Returns the HTTP status code, if this is an HTTP status error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_decode() {
            Self::Json(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<url::ParseError> for NetworkError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for NetworkError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for NetworkError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for NetworkError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

/// A specialized Result type for network operations.
pub type Result<T> = std::result::Result<T, NetworkError>;
