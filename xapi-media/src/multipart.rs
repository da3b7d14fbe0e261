//! `multipart/form-data` bodies.
//!
//! Sections are CRLF-delimited. Text fields carry only a
//! `Content-Disposition`; binary parts add `Content-Type:
//! application/octet-stream`.

use rand::RngCore;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use std::fmt::Display;
use xapi_core::DEFAULT_MIME_TYPE;
use xapi_http::XError;

/// Builds a multipart body in memory.
#[derive(Debug, Clone)]
pub struct Multipart {
    boundary: String,
    body: Vec<u8>,
}

impl Multipart {
    /// Starts a body with a random boundary.
    pub fn new() -> Self {
        Self::with_boundary(random_boundary())
    }

    /// Starts a body with a fixed boundary.
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            body: Vec::new(),
        }
    }

    /// The boundary string, without leading dashes.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Appends a text field.
    #[must_use]
    pub fn text(mut self, name: &str, value: impl Display) -> Self {
        self.open_section(name, None);
        self.body.extend_from_slice(b"\r\n");
        self.body.extend_from_slice(value.to_string().as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Appends an optional text field; `None` writes nothing.
    #[must_use]
    pub fn text_opt(self, name: &str, value: Option<impl Display>) -> Self {
        match value {
            Some(value) => self.text(name, value),
            None => self,
        }
    }

    /// Appends a binary part.
    #[must_use]
    pub fn bytes(mut self, name: &str, filename: Option<&str>, content: &[u8]) -> Self {
        self.open_section(name, filename);
        self.body.extend_from_slice(format!("Content-Type: {DEFAULT_MIME_TYPE}\r\n\r\n").as_bytes());
        self.body.extend_from_slice(content);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Request headers carrying [`Self::content_type`].
    pub fn headers(&self) -> Result<HeaderMap, XError> {
        let value = HeaderValue::from_str(&self.content_type())
            .map_err(|e| XError::InvalidHeader(e.to_string()))?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, value);
        Ok(headers)
    }

    /// Writes the closing delimiter and returns the body.
    pub fn finish(mut self) -> Vec<u8> {
        self.body.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }

    fn open_section(&mut self, name: &str, filename: Option<&str>) {
        let disposition = match filename {
            Some(filename) => {
                format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n")
            }
            None => format!("Content-Disposition: form-data; name=\"{name}\"\r\n"),
        };
        self.body.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.body.extend_from_slice(disposition.as_bytes());
    }
}

impl Default for Multipart {
    fn default() -> Self {
        Self::new()
    }
}

/// 16 random bytes as 32 hex characters.
pub fn random_boundary() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
