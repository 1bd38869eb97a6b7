//! Shared error type across flowmetrics crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed config.
    BadRequest,
    /// Origin not allowed by CORS policy.
    CorsRejected,
    /// Device token failed verification.
    InvalidToken,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::CorsRejected => "CORS_REJECTED",
            ClientCode::InvalidToken => "INVALID_TOKEN",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, FlowMetricsError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum FlowMetricsError {
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Message is matched verbatim by CORS clients; keep it stable.
    #[error("CORS Error")]
    Cors,
    #[error("invalid flow token: {0}")]
    InvalidToken(&'static str),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl FlowMetricsError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            FlowMetricsError::BadRequest(_) => ClientCode::BadRequest,
            FlowMetricsError::Cors => ClientCode::CorsRejected,
            FlowMetricsError::InvalidToken(_) => ClientCode::InvalidToken,
            FlowMetricsError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            FlowMetricsError::Internal(_) => ClientCode::Internal,
        }
    }
}
