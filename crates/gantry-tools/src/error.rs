//! Tool-boundary error types

use gantry_connect::ConnectError;
use thiserror::Error;

/// Errors surfaced at the tool dispatch boundary
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments did not match the tool's declared input schema
    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    /// No tool registered under this name
    #[error("Unknown tool: {name} (known tools: {known})")]
    UnknownTool { name: String, known: String },

    /// Error propagated unmodified from the connect core
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// JSON error while reshaping a result
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for tool operations
pub type Result<T> = std::result::Result<T, ToolError>;
