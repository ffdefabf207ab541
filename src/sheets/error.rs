use std::fmt;
use thiserror::Error;

/// Boxed cause carried by a [`TransportFailure`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Broad classification of a failed remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Workbook, sheet or grid does not resolve on the remote side
    NotFound,
    /// Token missing, expired or lacking permission
    Unauthorized,
    /// Remote quota exceeded
    RateLimited,
    /// Remote refused the request for any other reason
    Rejected,
    /// Connection, TLS or timeout failure before a response arrived
    Network,
    /// Response body could not be interpreted
    Decode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::NotFound => "not found",
            FailureKind::Unauthorized => "unauthorized",
            FailureKind::RateLimited => "rate limited",
            FailureKind::Rejected => "rejected",
            FailureKind::Network => "network failure",
            FailureKind::Decode => "malformed response",
        };
        f.write_str(name)
    }
}

/// Failure reported by a [`Transport`](super::transport::Transport)
///
/// The underlying cause (HTTP client error, JSON error, ...) is kept as the
/// error `source()` so nothing is lost when it is wrapped into
/// [`SheetsError::Transport`].
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct TransportFailure {
    pub kind: FailureKind,
    pub message: String,
    /// HTTP status, when the failure came from a response
    pub status: Option<u16>,
    #[source]
    source: Option<BoxError>,
}

impl TransportFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        TransportFailure {
            kind,
            message: message.into(),
            status: None,
            source: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NotFound, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Decode, message)
    }
}

/// Errors that can occur when talking to a spreadsheet workbook
#[derive(Debug, Error)]
pub enum SheetsError {
    /// Bad construction arguments or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed range, index or matrix, rejected before any remote call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Workbook, sheet or range does not resolve remotely
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network, auth, rate-limit or unexpected remote failure
    #[error("Transport error: {0}")]
    Transport(#[source] TransportFailure),
}

impl From<TransportFailure> for SheetsError {
    fn from(failure: TransportFailure) -> Self {
        match failure.kind {
            FailureKind::NotFound => SheetsError::NotFound(failure.message),
            _ => SheetsError::Transport(failure),
        }
    }
}

/// Type alias for Results using SheetsError
pub type Result<T> = std::result::Result<T, SheetsError>;
