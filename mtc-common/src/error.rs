//! Common error types for MTC

use thiserror::Error;

/// Common result type for MTC operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the MTC crates
#[derive(Error, Debug)]
pub enum Error {
    /// Remote service responded with a non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Request never produced an HTTP response (DNS, connect, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Remote build ended in the Faulted state; carries the build message
    #[error("Build faulted: {0}")]
    BuildFaulted(String),

    /// Draft archive assembly produced no files
    #[error("No generated draft is available to download")]
    NothingToDownload,

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Archive serialization error
    #[error("Archive error: {0}")]
    Archive(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed response body
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Error {
    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
