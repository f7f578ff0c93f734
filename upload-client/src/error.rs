//! Error types for the upload client

use std::path::PathBuf;

use thiserror::Error;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Everything that can end an upload attempt
#[derive(Error, Debug)]
pub enum ClientError {
    /// The issuer or the storage service could not be reached, or the response was unreadable
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The peer answered with a non-success status
    #[error("Request failed with status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// The issuer base URL cannot be used
    #[error("Invalid issuer URL: {0}")]
    InvalidIssuerUrl(#[from] url::ParseError),

    /// The local file could not be read
    #[error("Cannot read {path}: {source}")]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The path does not name a file with a usable name
    #[error("Not an uploadable file: {0}")]
    InvalidFile(PathBuf),
}
