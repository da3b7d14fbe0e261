//! Core error types for `xapi`.

use thiserror::Error;

/// Local validation errors.
///
/// These are raised before any network call is made, so an operation that
/// fails with a `CoreError` has not sent anything to the API.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A caller-supplied argument was rejected.
    #[error("{0}")]
    InvalidArgument(String),

    /// A file the operation depends on does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// The media type of a file is unsupported for the endpoint.
    #[error("{0}")]
    InvalidMediaType(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
