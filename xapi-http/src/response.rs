//! Terminal responses and their interpretation.

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, LOCATION};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{HttpError, XError};

// ============================================================================
// Response
// ============================================================================

/// A fully read HTTP response. Never mutated after it is received.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Response {
    /// Creates a response from its parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self { status, headers, body }
    }

    /// Reads a reqwest response to the end.
    pub(crate) async fn from_reqwest(response: reqwest::Response) -> Result<Self, XError> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        Ok(Self { status, headers, body })
    }

    /// Status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Body bytes, empty if there was none.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Standard reason phrase for the status.
    pub fn reason(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    /// `Content-Type` header, if readable.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE)?.to_str().ok()
    }

    /// `application/json` or `application/problem+json`.
    pub fn is_json(&self) -> bool {
        self.content_type().is_some_and(|ct| {
            let ct = ct.to_ascii_lowercase();
            ct.contains("application/json") || ct.contains("application/problem+json")
        })
    }

    /// `Location` of a 3xx response.
    pub fn redirect_location(&self) -> Option<&str> {
        if !self.status.is_redirection() {
            return None;
        }
        self.headers.get(LOCATION)?.to_str().ok()
    }
}

// ============================================================================
// Response Parser
// ============================================================================

/// Turns a terminal response into a parsed body or an [`HttpError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseParser;

impl ResponseParser {
    /// Creates a parser.
    pub fn new() -> Self {
        Self
    }

    /// Parses a response body.
    ///
    /// Non-2xx statuses fail with [`XError::Http`]. A 204, an empty body or
    /// a body that is not JSON yields `Ok(None)`. The body is tried as JSON
    /// whatever the `Content-Type` says. Valid JSON that does not fit `T`
    /// fails with [`XError::Json`].
    pub fn parse<T: DeserializeOwned>(&self, response: &Response) -> Result<Option<T>, XError> {
        if !response.status().is_success() {
            return Err(self.error(response).into());
        }
        if response.status() == StatusCode::NO_CONTENT || response.body().is_empty() {
            return Ok(None);
        }

        let value: Value = match serde_json::from_slice(response.body()) {
            Ok(value) => value,
            Err(e) => {
                debug!(
                    error = %e,
                    content_type = response.content_type().unwrap_or_default(),
                    "Ignoring non-JSON success body"
                );
                return Ok(None);
            }
        };
        Ok(Some(serde_json::from_value(value)?))
    }

    /// Builds the typed error for a non-2xx response.
    pub fn error(&self, response: &Response) -> HttpError {
        HttpError::new(
            response.status(),
            response.headers().clone(),
            response.body().to_vec(),
            error_message(response),
        )
    }
}

/// Derives a readable message for an error response.
///
/// For JSON bodies the first match wins: an `errors` array of `{message}`
/// objects joined with `", "`, then `"<title>: <detail>"`, then `error`.
/// Anything else falls back to the reason phrase.
pub fn error_message(response: &Response) -> String {
    if response.is_json() {
        if let Ok(body) = serde_json::from_slice::<Value>(response.body()) {
            if let Some(message) = message_from_json(&body) {
                return message;
            }
        }
    }
    response.reason().to_string()
}

fn message_from_json(body: &Value) -> Option<String> {
    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        let messages: Vec<&str> = errors
            .iter()
            .filter_map(|e| e.get("message").and_then(Value::as_str))
            .collect();
        return Some(messages.join(", "));
    }
    if let (Some(title), Some(detail)) = (
        body.get("title").and_then(Value::as_str),
        body.get("detail").and_then(Value::as_str),
    ) {
        return Some(format!("{title}: {detail}"));
    }
    body.get("error").and_then(Value::as_str).map(str::to_string)
}
