//! Upload error types.

use serde_json::Value;
use thiserror::Error;
use xapi_core::CoreError;
use xapi_http::XError;

/// Errors from media and profile uploads.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Request pipeline failure, including HTTP error statuses.
    #[error(transparent)]
    Http(#[from] XError),

    /// Local validation failed; nothing was sent.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Reading the source file or writing a segment failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server finished processing with state `failed`.
    #[error("Media processing failed")]
    ProcessingFailed {
        /// Last status body returned by the server.
        status: Value,
    },

    /// A response was missing a member the upload needs.
    #[error("Invalid upload response: {0}")]
    InvalidResponse(String),
}

impl MediaError {
    /// The underlying pipeline error, if any.
    pub fn as_http(&self) -> Option<&XError> {
        match self {
            Self::Http(e) => Some(e),
            _ => None,
        }
    }

    /// Returns true if nothing was sent because validation failed.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Core(_))
    }
}
