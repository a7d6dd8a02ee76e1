//! Connect error types

use thiserror::Error;

/// Errors produced by the App Store Connect core
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Missing or unusable credentials at startup
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Credentials are present but structurally invalid
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Non-2xx response from the API; message is the upstream error detail
    /// when a structured body is present, the HTTP status text otherwise
    #[error("API Error: {message}")]
    Api { status: u16, message: String },

    /// HTTP 404 from a report endpoint: the report has not been generated
    /// yet (Apple produces them asynchronously, up to 24 hours later)
    #[error("Report not yet available: {0}")]
    ReportNotReady(String),

    /// Transport or non-2xx failure while fetching an analytics segment
    #[error("Segment download failed: {status} {status_text}: {body_prefix}")]
    SegmentDownload {
        status: u16,
        status_text: String,
        body_prefix: String,
    },

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JWT error
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for connect operations
pub type Result<T> = std::result::Result<T, ConnectError>;
