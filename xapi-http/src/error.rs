//! Error taxonomy for the request pipeline.
//!
//! Transport failures, HTTP error statuses, redirect exhaustion and local
//! request-construction problems all surface as [`XError`]. Non-2xx responses
//! carry an [`HttpError`] whose [`ErrorKind`] is derived from the status code.

use chrono::Utc;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde_json::Value;
use thiserror::Error;
use xapi_core::{CoreError, RateLimit, RateLimits};

// ============================================================================
// Main Error
// ============================================================================

/// Error type for every operation in this crate.
#[derive(Debug, Error)]
pub enum XError {
    /// Transport failure: refused, reset, timed out or TLS.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("{0}")]
    Http(Box<HttpError>),

    /// The redirect hop budget was exhausted.
    #[error("Too many redirects (limit {limit})")]
    TooManyRedirects {
        /// Configured maximum number of hops.
        limit: u32,
    },

    /// HTTP method other than GET, POST, PUT or DELETE.
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// URL could not be parsed or is not http(s).
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Header name or value is not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Proxy URL is malformed or uses an unsupported scheme.
    #[error("Invalid proxy: {0}")]
    InvalidProxy(String),

    /// OAuth 2.0 refresh was rejected or could not be attempted.
    #[error("{0}")]
    TokenRefresh(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local validation error.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<HttpError> for XError {
    fn from(err: HttpError) -> Self {
        Self::Http(Box::new(err))
    }
}

impl XError {
    /// The HTTP error, if this is one.
    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            Self::Http(err) => Some(err),
            _ => None,
        }
    }

    /// The error kind of an HTTP error.
    pub fn kind(&self) -> Option<ErrorKind> {
        self.as_http().map(HttpError::kind)
    }

    /// Returns true for network errors and 5xx responses.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http(err) => err.is_server_error(),
            _ => false,
        }
    }

    /// Returns true if a caller may reasonably retry.
    ///
    /// Covers everything [`is_transient`](Self::is_transient) does plus 429,
    /// which should wait for [`HttpError::retry_after`] first.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http(err) => err.is_retryable(),
            _ => false,
        }
    }
}

// ============================================================================
// Error Kind
// ============================================================================

/// Classification of an HTTP error status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 400
    BadRequest,
    /// 401
    Unauthorized,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 406
    NotAcceptable,
    /// 409
    Conflict,
    /// 410
    Gone,
    /// 413
    PayloadTooLarge,
    /// 422
    UnprocessableEntity,
    /// 429
    TooManyRequests,
    /// 500
    InternalServerError,
    /// 502
    BadGateway,
    /// 503
    ServiceUnavailable,
    /// 504
    GatewayTimeout,
    /// Any other non-2xx status.
    Other,
}

impl ErrorKind {
    /// Maps a status code to its kind.
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            406 => Self::NotAcceptable,
            409 => Self::Conflict,
            410 => Self::Gone,
            413 => Self::PayloadTooLarge,
            422 => Self::UnprocessableEntity,
            429 => Self::TooManyRequests,
            500 => Self::InternalServerError,
            502 => Self::BadGateway,
            503 => Self::ServiceUnavailable,
            504 => Self::GatewayTimeout,
            _ => Self::Other,
        }
    }
}

// ============================================================================
// HTTP Error
// ============================================================================

/// A non-2xx response, kept whole so callers can inspect it.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HttpError {
    kind: ErrorKind,
    status: StatusCode,
    message: String,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl HttpError {
    /// Creates an error for a response with an already derived message.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>, message: String) -> Self {
        Self {
            kind: ErrorKind::from_status(status),
            status,
            message,
            headers,
            body,
        }
    }

    /// Error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Human readable message derived from the body or reason phrase.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw response body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Response body decoded as JSON, if it is JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// 4xx status.
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// 5xx status.
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// 5xx or 429.
    pub fn is_retryable(&self) -> bool {
        self.is_server_error() || self.kind == ErrorKind::TooManyRequests
    }

    /// Every rate-limit window reported in the headers.
    pub fn rate_limits(&self) -> RateLimits {
        RateLimits::from_headers(
            self.headers
                .iter()
                .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?))),
        )
    }

    /// The window that governs when requests may resume.
    pub fn rate_limit(&self) -> Option<RateLimit> {
        self.rate_limits().effective().cloned()
    }

    /// Seconds until the governing window resets, never negative.
    pub fn retry_after(&self) -> Option<u64> {
        self.rate_limits().retry_after_at(Utc::now())
    }
}
